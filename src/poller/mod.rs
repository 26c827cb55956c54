//! Window scheduling and the per-window fetch cycle

use crate::timestamp::TimestampError;

pub mod cycle;
pub mod scheduler;
pub mod window;

pub use cycle::{CycleOutcome, FetchCycle, OutputDisposition};
pub use scheduler::{RunSummary, Scheduler, SchedulerState};
pub use window::{bootstrap, is_ready, ready_at, remaining_wait, Bootstrap, TimeWindow, WindowOrigin};

/// Poller errors
///
/// Only startup problems surface here. Failures inside a cycle are logged and
/// the run carries on with the next window.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// A start, end or checkpoint value could not be parsed
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// Window end does not come after its start
    #[error("invalid window: end {end} is not after start {start}")]
    InvalidWindow {
        /// Canonical start
        start: String,
        /// Canonical end
        end: String,
    },

    /// Date arithmetic left the representable range
    #[error("time out of range: {0}")]
    OutOfRange(String),
}
