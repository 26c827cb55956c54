//! Output files
//!
//! Raw response bodies are written verbatim, one file per UTC hour bucket.
//! A second write into the same bucket replaces the earlier file.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::debug;

pub mod path;

pub use path::{HourBucket, OutputPathBuilder};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes payloads under an output root
#[derive(Debug, Clone)]
pub struct OutputStore {
    root_dir: PathBuf,
}

impl OutputStore {
    /// Store rooted at `root_dir` (the outbox)
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Where a window starting at `start` is written
    pub fn path_for(&self, start: DateTime<Utc>) -> PathBuf {
        OutputPathBuilder::for_window_start(self.root_dir.clone(), start).build()
    }

    /// Write `payload` for the window starting at `start`, replacing any
    /// earlier file in the same hour bucket.
    pub fn write(&self, start: DateTime<Utc>, payload: &Bytes) -> OutputResult<PathBuf> {
        let builder = OutputPathBuilder::for_window_start(self.root_dir.clone(), start);
        builder.ensure_directories()?;

        let path = builder.build();
        std::fs::write(&path, payload).map_err(|e| {
            OutputError::IoError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), bytes = payload.len(), "Output file written");
        Ok(path)
    }
}
