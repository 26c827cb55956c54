//! CLI error types and conversions

use crate::config::ConfigError;
use crate::fetcher::FetcherError;
use crate::poller::PollError;
use crate::resume::CheckpointError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Checkpoint error
    #[error("checkpoint error: {0}")]
    CheckpointError(#[from] CheckpointError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Poller error
    #[error("poller error: {0}")]
    PollError(#[from] PollError),

    /// Metrics exporter could not be started
    #[error("metrics error: {0}")]
    MetricsError(String),

    /// Report could not be rendered
    #[error("serialization error: {0}")]
    SerializationError(String),
}
