//! Immutable run configuration handed to the scheduler

use super::defaults::*;
use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How many windows a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// A single window, then exit
    OneShot,
    /// Loop over successive windows until shut down
    Continuous,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::OneShot => write!(f, "one_time"),
            RunMode::Continuous => write!(f, "real-time"),
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one_time" | "one-time" | "onetime" | "one-shot" | "oneshot" => Ok(RunMode::OneShot),
            "real-time" | "real_time" | "realtime" | "continuous" => Ok(RunMode::Continuous),
            _ => Err(format!(
                "Invalid run mode: {s}. Valid options: one_time, real-time"
            )),
        }
    }
}

/// Where the first window's start comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSpec {
    /// Nothing supplied; derive from `now`
    Unset,
    /// Resume from the checkpoint file
    Checkpoint,
    /// Explicit input in any normalizer grammar
    Explicit(String),
}

impl StartSpec {
    /// Interpret a raw `start_time` value; `file` selects checkpoint mode.
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None | Some("") => StartSpec::Unset,
            Some(v) if v.eq_ignore_ascii_case(START_FROM_FILE) => StartSpec::Checkpoint,
            Some(v) => StartSpec::Explicit(v.to_string()),
        }
    }
}

/// Scheduler settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// One window or many
    pub run_mode: RunMode,
    /// Length of every window after the first
    pub query_length: TimeDelta,
    /// Data availability delay after a window closes
    pub min_latency: TimeDelta,
    /// Sleep increment between steady-state windows
    pub poll_interval: Duration,
    /// Sleep increment while waiting for the first window
    pub hold_off_poll: Duration,
    /// Bootstrap distance when resuming without a checkpoint
    pub initial_lookback: TimeDelta,
    /// First window start
    pub start: StartSpec,
    /// Explicit end of a single window
    pub end: Option<String>,
}

impl RunConfiguration {
    /// Whether successful windows are recorded in the checkpoint file
    pub fn checkpoint_enabled(&self) -> bool {
        matches!(self.start, StartSpec::Checkpoint)
    }
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            run_mode: RunMode::OneShot,
            query_length: TimeDelta::seconds(DEFAULT_QUERY_LENGTH_SECS as i64),
            min_latency: TimeDelta::seconds(COMPLIANCE_MIN_LATENCY_SECS),
            poll_interval: Duration::from_secs(DEFAULT_SLEEP_TIME_SECS),
            hold_off_poll: Duration::from_secs(DEFAULT_HOLD_OFF_SECS),
            initial_lookback: TimeDelta::hours(DEFAULT_INITIAL_GO_BACK_HOURS as i64),
            start: StartSpec::Unset,
            end: None,
        }
    }
}
