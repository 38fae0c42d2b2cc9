use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::asset::BatchJob;
use crate::exiftool::MetadataTool;
use crate::library::PhotoLibrary;
use crate::pipeline::{run_batch, BatchEvent, BatchReport};

/// A batch running on its own worker thread.
///
/// Events arrive in the order the pipeline emits them; the channel closes
/// once the batch is done.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    thread: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Blocking iterator over the remaining events.
    pub fn events(&self) -> impl Iterator<Item = BatchEvent> + '_ {
        self.events.iter()
    }

    pub fn join(self) -> anyhow::Result<BatchReport> {
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("batch worker panicked"))
    }
}

/// Start `job` on a dedicated thread.
pub fn spawn_batch(
    job: BatchJob,
    library: Arc<dyn PhotoLibrary>,
    tool: Arc<dyn MetadataTool>,
    temp_dir: PathBuf,
) -> anyhow::Result<BatchHandle> {
    let (tx, rx) = mpsc::channel();
    let thread = std::thread::Builder::new()
        .name("photometa-batch".to_string())
        .spawn(move || {
            run_batch(&job, library.as_ref(), tool.as_ref(), &temp_dir, &mut |ev| {
                // The receiving side may have gone away; the batch still runs to completion.
                let _ = tx.send(ev);
            })
        })?;
    Ok(BatchHandle { events: rx, thread })
}
