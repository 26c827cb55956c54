//! Resume capability across restarts
//!
//! A single checkpoint file records the end of the last successfully fetched
//! window. There is no cross-process exclusion: one poller owns one file.

pub mod checkpoint;
pub mod lock;

pub use checkpoint::CheckpointStore;

/// Errors related to the checkpoint file
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),

    /// File exists but holds nothing
    #[error("checkpoint file is empty")]
    Empty,

    /// File is too large to be a checkpoint
    #[error("checkpoint file too large: {size} bytes (max: {max} bytes)")]
    TooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },
}
