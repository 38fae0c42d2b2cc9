use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::asset::{AssetRef, BatchJob, DateSource};
use crate::date::format_exif_timestamp;
use crate::error::ExportError;
use crate::exiftool::MetadataTool;
use crate::library::PhotoLibrary;
use crate::materialize::materialize;

/// A successfully rewritten asset. The rewritten copy stays on disk at
/// `path` for whoever handles completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSuccess {
    pub asset_id: String,
    pub file_name: String,
    pub info: String,
    pub path: PathBuf,
    pub applied: NaiveDateTime,
    pub diagnostics: String,
}

pub type ItemOutcome = Result<ItemSuccess, ExportError>;

/// Rewrite the capture dates of one asset.
///
/// The date is checked before anything touches the disk; a missing date
/// never creates a temp file nor launches ExifTool.
pub fn process_item(
    library: &dyn PhotoLibrary,
    tool: &dyn MetadataTool,
    asset: &AssetRef,
    date_source: DateSource,
    temp_dir: &Path,
) -> ItemOutcome {
    let applied = date_source.pick(asset).ok_or(ExportError::DateNotFound)?;
    let temp = materialize(library, asset, temp_dir)?;
    let rewritten = tool.rewrite_dates(temp, &format_exif_timestamp(&applied))?;

    let temp_name = rewritten
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ItemSuccess {
        asset_id: asset.id.clone(),
        file_name: asset.file_name.clone(),
        info: format!("EXIF mis à jour pour {}", temp_name),
        path: rewritten.path,
        applied,
        diagnostics: rewritten.diagnostics,
    })
}

/// Running tally of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub successes: usize,
    pub failures: usize,
    /// `"<short id>: <message>"`, in processing order
    pub failure_details: Vec<String>,
    pub updated: Vec<ItemSuccess>,
}

impl BatchReport {
    pub fn record(&mut self, asset: &AssetRef, outcome: &ItemOutcome) {
        match outcome {
            Ok(success) => {
                self.successes += 1;
                self.updated.push(success.clone());
            }
            Err(err) => {
                self.failures += 1;
                self.failure_details.push(format!("{}: {}", asset.short_id(), err));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.successes + self.failures
    }

    pub fn summary(&self) -> String {
        let mut message = format!("{} successes.", self.successes);
        if self.failures > 0 {
            message.push_str(&format!(" {} error(s).", self.failures));
        }
        if !self.failure_details.is_empty() {
            message.push_str("\nErrors:\n");
            message.push_str(&self.failure_details.join("\n"));
        }
        message
    }
}

/// State transitions of a batch, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started { total: usize, date_source: DateSource },
    Progress { index: usize, total: usize, short_id: String },
    ItemFinished { index: usize, asset_id: String, outcome: ItemOutcome },
    Finished(BatchReport),
}

impl BatchEvent {
    /// Status line to show for this transition, if it changes it.
    pub fn message(&self) -> Option<String> {
        match self {
            BatchEvent::Started { total, date_source } => Some(format!(
                "Starting processing of {} photo(s) using [{}]...",
                total,
                date_source.label()
            )),
            BatchEvent::Progress { index, total, short_id } => {
                Some(format!("Processing [{}/{}]: {}...", index + 1, total, short_id))
            }
            BatchEvent::ItemFinished { .. } => None,
            BatchEvent::Finished(report) => Some(report.summary()),
        }
    }
}

/// Process every asset of `job`, strictly one after another.
///
/// Item `i + 1` is not touched before the outcome of item `i` has been
/// recorded. Failures are recorded and never stop the batch.
pub fn run_batch(
    job: &BatchJob,
    library: &dyn PhotoLibrary,
    tool: &dyn MetadataTool,
    temp_dir: &Path,
    observer: &mut dyn FnMut(BatchEvent),
) -> BatchReport {
    let total = job.len();
    tracing::info!(total, source = ?job.date_source, "batch started");
    observer(BatchEvent::Started {
        total,
        date_source: job.date_source,
    });

    let mut report = BatchReport::default();
    for (index, asset) in job.assets.iter().enumerate() {
        observer(BatchEvent::Progress {
            index,
            total,
            short_id: asset.short_id(),
        });

        let outcome = process_item(library, tool, asset, job.date_source, temp_dir);
        match &outcome {
            Ok(ok) => tracing::debug!(id = %asset.id, info = %ok.info, "item updated"),
            Err(err) => tracing::warn!(id = %asset.id, %err, "item failed"),
        }
        report.record(asset, &outcome);

        observer(BatchEvent::ItemFinished {
            index,
            asset_id: asset.id.clone(),
            outcome,
        });
    }

    tracing::info!(successes = report.successes, failures = report.failures, "batch finished");
    observer(BatchEvent::Finished(report.clone()));
    report
}
