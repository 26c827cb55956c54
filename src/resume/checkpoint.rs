//! Checkpoint file holding the end of the last successful window
//!
//! The file is one line: the canonical `YYYYMMDDHHmm` timestamp. Writes go to
//! a temp file in the same directory that is then renamed over the target,
//! so a reader sees either the old value or the new one.

use super::lock::{with_exclusive, with_shared};
use super::CheckpointError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files larger than this are not checkpoints
pub const MAX_CHECKPOINT_FILE_SIZE: u64 = 4 * 1024;

/// Reads and writes the checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a checkpoint file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Last persisted value, or `None` when missing or unreadable
    pub fn load(&self) -> Option<String> {
        if !self.exists() {
            debug!(path = %self.path.display(), "No checkpoint file");
            return None;
        }

        match self.try_load() {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable checkpoint");
                None
            }
        }
    }

    /// Like [`load`](Self::load) but reports why a checkpoint could not be read
    pub fn try_load(&self) -> Result<Option<String>, CheckpointError> {
        with_shared(&self.path, || {
            let metadata = match std::fs::metadata(&self.path) {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(CheckpointError::IoError(e.to_string())),
            };
            if metadata.len() > MAX_CHECKPOINT_FILE_SIZE {
                return Err(CheckpointError::TooLarge {
                    size: metadata.len(),
                    max: MAX_CHECKPOINT_FILE_SIZE,
                });
            }

            let contents = std::fs::read_to_string(&self.path)
                .map_err(|e| CheckpointError::IoError(e.to_string()))?;
            let value = contents.trim();
            if value.is_empty() {
                return Err(CheckpointError::Empty);
            }

            debug!(path = %self.path.display(), checkpoint = value, "Checkpoint loaded");
            Ok(Some(value.to_string()))
        })
    }

    /// Replace the checkpoint with `timestamp`
    pub fn save(&self, timestamp: &str) -> Result<(), CheckpointError> {
        let parent_dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        with_exclusive(&self.path, || {
            let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
                .map_err(|e| CheckpointError::IoError(format!("Failed to create temp file: {e}")))?;

            writeln!(temp_file, "{timestamp}")
                .map_err(|e| CheckpointError::IoError(format!("Failed to write temp file: {e}")))?;
            temp_file
                .flush()
                .map_err(|e| CheckpointError::IoError(format!("Failed to flush temp file: {e}")))?;
            temp_file
                .as_file()
                .sync_all()
                .map_err(|e| CheckpointError::IoError(format!("Failed to sync temp file: {e}")))?;

            temp_file
                .persist(&self.path)
                .map_err(|e| CheckpointError::IoError(format!("Failed to persist checkpoint: {e}")))?;

            if let Err(e) = sync_dir(parent_dir) {
                debug!(dir = %parent_dir.display(), error = %e, "Checkpoint directory not synced");
            }
            Ok(())
        })?;

        info!(path = %self.path.display(), checkpoint = timestamp, "Checkpoint saved");
        Ok(())
    }

    /// Remove the checkpoint; missing files are fine
    pub fn clear(&self) -> Result<(), CheckpointError> {
        with_exclusive(&self.path, || match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::IoError(e.to_string())),
        })?;
        info!(path = %self.path.display(), "Checkpoint cleared");
        Ok(())
    }
}

/// Flush directory metadata so the rename survives a crash
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}
