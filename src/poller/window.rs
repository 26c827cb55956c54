//! Time windows and the readiness predicate
//!
//! Everything here is pure: `now` is always passed in.

use super::PollError;
use crate::config::{RunConfiguration, StartSpec};
use crate::timestamp::{format_canonical, resolve, truncate_to_minute};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

/// Half-open UTC interval `[start, end)` queried in one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window; `end` must come after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PollError> {
        if end <= start {
            return Err(PollError::InvalidWindow {
                start: format_canonical(start),
                end: format_canonical(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Window start
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `end - start`
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Following window: `[end, end + query_length)`
    pub fn next(&self, query_length: TimeDelta) -> Result<Self, PollError> {
        let end = checked_add(self.end, query_length)?;
        Self::new(self.end, end)
    }

    /// `fromDate` parameter
    pub fn from_date(&self) -> String {
        format_canonical(self.start)
    }

    /// `toDate` parameter
    pub fn to_date(&self) -> String {
        format_canonical(self.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from_date(), self.to_date())
    }
}

fn checked_add(time: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, PollError> {
    time.checked_add_signed(delta)
        .ok_or_else(|| PollError::OutOfRange(format!("{time} + {delta}")))
}

fn checked_sub(time: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, PollError> {
    time.checked_sub_signed(delta)
        .ok_or_else(|| PollError::OutOfRange(format!("{time} - {delta}")))
}

/// Earliest instant a request for `window` may be issued:
/// `end + query_length + min_latency`.
pub fn ready_at(window: &TimeWindow, config: &RunConfiguration) -> DateTime<Utc> {
    window
        .end()
        .checked_add_signed(config.query_length)
        .and_then(|t| t.checked_add_signed(config.min_latency))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whether `window` may be fetched at `now`
pub fn is_ready(now: DateTime<Utc>, window: &TimeWindow, config: &RunConfiguration) -> bool {
    now >= ready_at(window, config)
}

/// Time left before `window` becomes ready, `None` once it is
pub fn remaining_wait(
    now: DateTime<Utc>,
    window: &TimeWindow,
    config: &RunConfiguration,
) -> Option<Duration> {
    let ready = ready_at(window, config);
    if now >= ready {
        return None;
    }
    (ready - now).to_std().ok()
}

/// Where the first window came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOrigin {
    /// Explicit start time
    Explicit,
    /// Checkpoint file
    Checkpoint,
    /// Checkpoint mode with no checkpoint yet: `now - initial_lookback`
    Lookback,
    /// Nothing supplied: trailing the clock
    Derived,
}

impl fmt::Display for WindowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowOrigin::Explicit => "explicit",
            WindowOrigin::Checkpoint => "checkpoint",
            WindowOrigin::Lookback => "lookback",
            WindowOrigin::Derived => "derived",
        };
        f.write_str(name)
    }
}

/// First window of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootstrap {
    /// The window
    pub window: TimeWindow,
    /// An explicit end was given; stop after this window
    pub single_window: bool,
    /// How the start was chosen
    pub origin: WindowOrigin,
}

/// Compute the first window.
///
/// `checkpoint` is the raw checkpoint file content, consulted only when the
/// configuration resumes from the checkpoint file. Explicit start and end
/// values win over everything else.
pub fn bootstrap(
    config: &RunConfiguration,
    now: DateTime<Utc>,
    checkpoint: Option<&str>,
) -> Result<Bootstrap, PollError> {
    let explicit_end = config
        .end
        .as_deref()
        .map(|value| resolve(value, now))
        .transpose()?;

    let (start, origin) = match &config.start {
        StartSpec::Explicit(value) => (resolve(value, now)?, WindowOrigin::Explicit),
        StartSpec::Checkpoint => match checkpoint {
            Some(value) => (resolve(value, now)?, WindowOrigin::Checkpoint),
            None => (
                truncate_to_minute(checked_sub(now, config.initial_lookback)?),
                WindowOrigin::Lookback,
            ),
        },
        StartSpec::Unset => {
            let end = match explicit_end {
                Some(end) => end,
                None => {
                    let trailing = checked_sub(now, config.query_length)?;
                    truncate_to_minute(checked_sub(trailing, config.min_latency)?)
                }
            };
            (checked_sub(end, config.query_length)?, WindowOrigin::Derived)
        }
    };

    let end = match explicit_end {
        Some(end) => end,
        None => checked_add(start, config.query_length)?,
    };

    Ok(Bootstrap {
        window: TimeWindow::new(start, end)?,
        single_window: explicit_end.is_some(),
        origin,
    })
}
