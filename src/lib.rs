//! # Compliance Poller Library
//!
//! Polls a compliance-events HTTP endpoint over successive, non-overlapping
//! UTC time windows and stores every response body on disk, partitioned by
//! the hour each window starts in.
//!
//! ## Features
//!
//! - **Flexible timestamps**: `YYYYMMDDHHmm`, `YYYY-MM-DD HH:MM`, ISO 8601 and
//!   relative offsets (`90m`, `24h`, `2d`) all normalize to one canonical form
//! - **Latency aware**: a window is only requested once the endpoint has had
//!   time to settle it
//! - **Resumable**: the end of the last successful window is checkpointed
//!   atomically and picked up on restart
//! - **One-shot or continuous**: fetch a single window, or follow the clock
//!
//! ## Quick Start
//!
//! ```no_run
//! use compliance_poller::clock::SystemClock;
//! use compliance_poller::config::{AppConfig, ConfigOverrides};
//! use compliance_poller::fetcher::ComplianceHttpClient;
//! use compliance_poller::output::OutputStore;
//! use compliance_poller::poller::{FetchCycle, Scheduler};
//! use compliance_poller::resume::CheckpointStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("config.yaml", &ConfigOverrides::default())?;
//! let client = ComplianceHttpClient::new(&config.endpoint, config.credentials.clone())?;
//! let cycle = FetchCycle::new(
//!     Arc::new(client),
//!     OutputStore::new(&config.out_box),
//!     config.filters.clone(),
//! );
//! let mut scheduler = Scheduler::new(
//!     config.run.clone(),
//!     cycle,
//!     CheckpointStore::new(&config.checkpoint_file),
//!     SystemClock::shared(),
//! );
//! let summary = scheduler.run().await?;
//! println!("{} windows fetched", summary.windows_succeeded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`timestamp`] - Timestamp normalization to `YYYYMMDDHHmm`
//! - [`poller`] - Window computation, scheduling and the fetch cycle
//! - [`fetcher`] - Compliance endpoint client
//! - [`output`] - Hour-bucketed output files
//! - [`resume`] - Checkpoint file
//! - [`config`] - YAML configuration and validation

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Injectable wall clock
pub mod clock;

/// Configuration file loading
pub mod config;

/// Compliance endpoint client
pub mod fetcher;

/// Tracing subscriber setup
pub mod logging;

/// Metrics and observability
pub mod metrics;

/// Output file layout and writing
pub mod output;

/// Window scheduling
pub mod poller;

/// Checkpoint persistence
pub mod resume;

/// Graceful shutdown
pub mod shutdown;

/// Timestamp normalization
pub mod timestamp;

pub use config::{AppConfig, RunConfiguration, RunMode};
pub use fetcher::{ComplianceSource, FetchResult, FetchStatus};
pub use poller::{RunSummary, Scheduler, TimeWindow};
pub use timestamp::normalize;
