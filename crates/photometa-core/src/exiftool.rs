use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempPath;

use crate::error::{suppress_benign, ExportError};

/// File name of the bundled ExifTool script.
pub const TOOL_NAME: &str = "exiftool";
/// Perl modules shipped next to the bundled script.
pub const SUPPORT_LIB_DIR: &str = "Image-ExifTool/lib";
pub const SUPPORT_LIB_ENV: &str = "PERL5LIB";

/// A file whose date fields were rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub path: PathBuf,
    /// Trimmed stderr with ExifTool's own confirmation suppressed
    pub diagnostics: String,
}

/// Something that can stamp the three capture date fields of a file.
///
/// Takes ownership of the temp file: it is deleted on every error path and
/// handed back as a plain path on success.
pub trait MetadataTool: Send + Sync {
    fn rewrite_dates(&self, file: TempPath, timestamp: &str) -> Result<Rewritten, ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifTool {
    executable: PathBuf,
    support_lib: Option<PathBuf>,
}

impl ExifTool {
    pub fn new(executable: impl Into<PathBuf>, support_lib: Option<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            support_lib,
        }
    }

    /// The copy shipped alongside the running binary.
    pub fn bundled() -> io::Result<Self> {
        Ok(Self::in_resources(&resources_dir()?))
    }

    pub fn in_resources(dir: &Path) -> Self {
        Self::new(dir.join(TOOL_NAME), Some(dir.join(SUPPORT_LIB_DIR)))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn support_lib(&self) -> Option<&Path> {
        self.support_lib.as_deref()
    }

    pub fn arguments(file: &Path, timestamp: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-overwrite_original".into()];
        for tag in ["DateTimeOriginal", "CreateDate", "ModifyDate"] {
            args.push(format!("-{}={}", tag, timestamp).into());
        }
        args.push(file.as_os_str().to_owned());
        args
    }

    fn command(&self, file: &Path, timestamp: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(Self::arguments(file, timestamp))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match &self.support_lib {
            Some(lib) if lib.is_dir() => {
                cmd.env(SUPPORT_LIB_ENV, lib);
            }
            Some(lib) => {
                tracing::warn!(lib = %lib.display(), "ExifTool support library not found");
            }
            None => {}
        }
        cmd
    }
}

impl MetadataTool for ExifTool {
    fn rewrite_dates(&self, file: TempPath, timestamp: &str) -> Result<Rewritten, ExportError> {
        if !self.executable.is_file() {
            tracing::error!(path = %self.executable.display(), "ExifTool executable missing");
            return Err(ExportError::ExifToolNotFound);
        }

        tracing::debug!(file = %file.display(), %timestamp, "running exiftool");
        let output = self
            .command(&file, timestamp)
            .output()
            .map_err(|e| ExportError::ExifToolLaunchFailed(e.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::trace!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), %stderr);

        if !output.status.success() {
            return Err(ExportError::ExifToolExecutionFailed {
                code: output.status.code().unwrap_or(-1),
                details: stderr,
            });
        }

        let path = file
            .keep()
            .map_err(|e| ExportError::ExportFailed(e.error.to_string()))?;
        Ok(Rewritten {
            path,
            diagnostics: suppress_benign(&stderr).to_string(),
        })
    }
}

/// Directory holding bundled resources: the executable's own directory, or
/// `Contents/Resources` when running from inside a macOS app bundle.
pub fn resources_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))?;
    Ok(bundle_resources(exe_dir).unwrap_or_else(|| exe_dir.to_path_buf()))
}

fn bundle_resources(exe_dir: &Path) -> Option<PathBuf> {
    if exe_dir.file_name()? != "MacOS" {
        return None;
    }
    let resources = exe_dir.parent()?.join("Resources");
    resources.is_dir().then_some(resources)
}
