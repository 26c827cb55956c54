//! Advisory locking around checkpoint reads and writes
//!
//! Uses fd-lock on a `.lock` sibling of the checkpoint file so a reader never
//! interleaves with the rename performed by a writer.

use super::CheckpointError;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the lock file guarding `path`
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn open_lock_file(path: &Path) -> Result<RwLock<File>, CheckpointError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CheckpointError::IoError(e.to_string()))?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))
        .map_err(|e| CheckpointError::LockError(format!("Failed to open lock file: {e}")))?;

    Ok(RwLock::new(file))
}

/// Run `f` while holding the exclusive lock for `path`
pub fn with_exclusive<T>(
    path: &Path,
    f: impl FnOnce() -> Result<T, CheckpointError>,
) -> Result<T, CheckpointError> {
    let mut lock = open_lock_file(path)?;
    debug!(path = %path.display(), "Acquiring checkpoint write lock");
    let _guard = lock
        .write()
        .map_err(|e| CheckpointError::LockError(format!("Failed to acquire write lock: {e}")))?;
    f()
}

/// Run `f` while holding the shared lock for `path`
pub fn with_shared<T>(
    path: &Path,
    f: impl FnOnce() -> Result<T, CheckpointError>,
) -> Result<T, CheckpointError> {
    let lock = open_lock_file(path)?;
    debug!(path = %path.display(), "Acquiring checkpoint read lock");
    let _guard = lock
        .read()
        .map_err(|e| CheckpointError::LockError(format!("Failed to acquire read lock: {e}")))?;
    f()
}
