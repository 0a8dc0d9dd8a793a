//! Temporary artifact paths and directory management.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::naming::sanitize_filename;

/// Suffix of a file that is still being written.
pub const PART_SUFFIX: &str = ".part";

/// Sibling path `<path>.part` used while a download is in progress.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(PART_SUFFIX);
    path.with_file_name(name)
}

/// Per-track work directory `.<track id>.tmp` next to the destination.
pub fn work_dir(destination: &Path, track_id: &str) -> Result<PathBuf> {
    let parent = destination.parent().ok_or_else(|| {
        Error::InvalidFilename(format!(
            "Destination has no parent directory: {}",
            destination.display()
        ))
    })?;
    let name = sanitize_filename(&format!(".{}.tmp", track_id))?;
    Ok(parent.join(name))
}

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    if !path.as_os_str().is_empty() {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Remove a file, ignoring "not found".
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Remove a directory tree, ignoring "not found".
pub async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
