//! Upward resolver file search.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Find `file_name` in `start` or the nearest ancestor directory.
///
/// Stops at the first match or at the filesystem root. A relative `start`
/// is taken from the current directory, so matches are always absolute. An
/// absolute `file_name` is checked once, as is.
pub async fn find_upward(start: &Path, file_name: &Path) -> Result<Option<PathBuf>> {
    if file_name.is_absolute() {
        return Ok(is_file(file_name).await?.then(|| file_name.to_path_buf()));
    }

    let mut current = std::path::absolute(start)?;
    loop {
        let candidate = current.join(file_name);
        tracing::debug!("Looking for resolver at {}", candidate.display());
        if is_file(&candidate).await? {
            return Ok(Some(candidate));
        }

        if !current.pop() {
            return Ok(None);
        }
    }
}

async fn is_file(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Directory containing `path`, falling back to `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
