pub mod asset;
pub mod collect;
pub mod date;
pub mod error;
pub mod exiftool;
pub mod library;
pub mod materialize;
pub mod pipeline;
pub mod state;
pub mod worker;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use asset::{AssetRef, BatchJob, DateSource};
pub use error::ExportError;
pub use exiftool::{ExifTool, MetadataTool};
pub use library::{Album, FolderLibrary, PhotoLibrary};
pub use pipeline::{run_batch, BatchEvent, BatchReport, ItemOutcome, ItemSuccess};
pub use state::{AppState, MessageTone};
pub use worker::{spawn_batch, BatchHandle};

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Where temp copies go and which ExifTool to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixOptions {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Explicit ExifTool executable instead of the bundled one
    #[serde(default)]
    pub exiftool: Option<PathBuf>,
    /// Explicit Perl library directory for ExifTool
    #[serde(default)]
    pub exiftool_lib: Option<PathBuf>,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            exiftool: None,
            exiftool_lib: None,
        }
    }
}

impl FixOptions {
    /// Resolve the ExifTool to run. Without an explicit executable the copy
    /// bundled next to the running binary is used; a missing bundle is only
    /// reported per item, when the tool is actually needed.
    pub fn exiftool(&self) -> std::io::Result<ExifTool> {
        let mut tool = match &self.exiftool {
            Some(exe) => ExifTool::new(exe, None),
            None => ExifTool::bundled()?,
        };
        if let Some(lib) = &self.exiftool_lib {
            tool = ExifTool::new(tool.executable(), Some(lib.clone()));
        }
        Ok(tool)
    }
}
