//! Working directory housekeeping

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

/// Remove the regular files directly inside `dir`
///
/// Subdirectories are left alone. A missing directory is a no-op, and files
/// that cannot be removed are logged and skipped. Returns how many files
/// were removed.
pub fn clear_files(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist, nothing to clean", dir.display());
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} stale files from {}", removed, dir.display());
    }
    Ok(removed)
}
