use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::pipeline::ItemSuccess;

/// Where one rewritten copy ended up.
#[derive(Debug)]
pub struct Collected {
    /// Final location, or the untouched temp path when the move failed
    pub path: PathBuf,
    pub error: Option<anyhow::Error>,
}

impl Collected {
    pub fn moved(&self) -> bool {
        self.error.is_none()
    }
}

/// Move rewritten copies out of the temp directory into `output_dir`, under
/// their original file names, and set each file's mtime to the applied date.
///
/// Every item is attempted; one that cannot be moved stays at its temp path.
/// The result follows the order of `updated`.
pub fn collect_results(updated: &[ItemSuccess], output_dir: &Path) -> Vec<Collected> {
    if let Err(err) = fs::create_dir_all(output_dir) {
        tracing::warn!(dir = %output_dir.display(), %err, "cannot create output directory");
        return updated
            .iter()
            .map(|item| Collected {
                path: item.path.clone(),
                error: Some(anyhow::anyhow!(
                    "cannot create output directory {}: {}",
                    output_dir.display(),
                    err
                )),
            })
            .collect();
    }

    let mut used: HashSet<PathBuf> = HashSet::new();
    let mut collected = Vec::with_capacity(updated.len());

    for item in updated {
        match collect_one(item, output_dir, &used) {
            Ok(dest) => {
                used.insert(dest.clone());
                collected.push(Collected { path: dest, error: None });
            }
            Err(err) => {
                tracing::warn!(path = %item.path.display(), err = %format!("{:#}", err), "rewritten copy left in place");
                collected.push(Collected {
                    path: item.path.clone(),
                    error: Some(err),
                });
            }
        }
    }

    let moved = collected.iter().filter(|c| c.moved()).count();
    tracing::info!(moved, total = updated.len(), dir = %output_dir.display(), "collected rewritten photos");
    collected
}

fn collect_one(item: &ItemSuccess, output_dir: &Path, used: &HashSet<PathBuf>) -> anyhow::Result<PathBuf> {
    let dest = unique_destination(output_dir, &item.file_name, used);
    move_file(&item.path, &dest)
        .with_context(|| format!("cannot move {} to {}", item.path.display(), dest.display()))?;

    // The applied date is local wall time; convert back to an epoch for mtime.
    if let Some(local) = item.applied.and_local_timezone(chrono::Local).single() {
        let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
        if let Err(err) = filetime::set_file_mtime(&dest, ft) {
            tracing::warn!(path = %dest.display(), %err, "cannot set mtime");
        }
    }
    Ok(dest)
}

/// `name`, or `stem(1).ext`, `stem(2).ext`, ... when taken.
fn unique_destination(dir: &Path, name: &str, used: &HashSet<PathBuf>) -> PathBuf {
    let free = |candidate: &PathBuf| !used.contains(candidate) && !candidate.exists();
    let base = dir.join(name);
    if free(&base) {
        return base;
    }

    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(name).extension().and_then(|s| s.to_str());

    let mut n: u64 = 1;
    loop {
        let candidate = match ext {
            Some(ext) => dir.join(format!("{}({}).{}", stem, n, ext)),
            None => dir.join(format!("{}({})", stem, n)),
        };
        if free(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
