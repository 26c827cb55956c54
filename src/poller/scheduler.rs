//! Window scheduler
//!
//! Drives the run: bootstrap the first window, wait until it is safely in the
//! past, fetch it, record progress, advance. One request is in flight at a
//! time and the only suspension points are the waits and the request itself.

use super::cycle::FetchCycle;
use super::window::{bootstrap, remaining_wait, TimeWindow};
use super::PollError;
use crate::clock::{Clock, SharedClock};
use crate::config::{RunConfiguration, RunMode};
use crate::metrics;
use crate::resume::CheckpointStore;
use crate::shutdown::{get_global_shutdown, SharedShutdown};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Computing the first window
    Bootstrapping,
    /// Sleeping until the current window is ready
    Waiting,
    /// Request in flight
    Fetching,
    /// Recording the window end in the checkpoint file
    Persisting,
    /// Run finished
    Terminated,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Bootstrapping => "bootstrapping",
            SchedulerState::Waiting => "waiting",
            SchedulerState::Fetching => "fetching",
            SchedulerState::Persisting => "persisting",
            SchedulerState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Requests issued
    pub windows_attempted: u64,
    /// Requests answered with a 200
    pub windows_succeeded: u64,
    /// Last window requested
    pub last_window: Option<TimeWindow>,
}

/// Runs windows one after another until done or shut down
pub struct Scheduler {
    config: RunConfiguration,
    cycle: FetchCycle,
    checkpoints: CheckpointStore,
    clock: SharedClock,
    shutdown: Option<SharedShutdown>,
    state: SchedulerState,
}

impl Scheduler {
    /// Scheduler using the global shutdown handle, if one is registered.
    ///
    /// `checkpoints` is only touched when the configuration resumes from the
    /// checkpoint file.
    pub fn new(
        config: RunConfiguration,
        cycle: FetchCycle,
        checkpoints: CheckpointStore,
        clock: SharedClock,
    ) -> Self {
        Self {
            config,
            cycle,
            checkpoints,
            clock,
            shutdown: get_global_shutdown(),
            state: SchedulerState::Bootstrapping,
        }
    }

    /// Use `shutdown` instead of the global handle
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Scheduler state change");
            self.state = next;
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Run until the configured windows are done or shutdown is requested.
    ///
    /// Fails only while bootstrapping; per-window failures are logged and the
    /// run moves on.
    pub async fn run(&mut self) -> Result<RunSummary, PollError> {
        self.transition(SchedulerState::Bootstrapping);

        let checkpoint = if self.config.checkpoint_enabled() {
            self.checkpoints.load()
        } else {
            None
        };
        let boot = bootstrap(&self.config, self.clock.now(), checkpoint.as_deref())?;
        let stop_after_first = boot.single_window || self.config.run_mode == RunMode::OneShot;

        info!(
            window = %boot.window,
            origin = %boot.origin,
            run_mode = %self.config.run_mode,
            single_window = stop_after_first,
            "Bootstrapped first window"
        );

        let mut summary = RunSummary::default();
        let mut window = boot.window;
        let mut increment = self.config.hold_off_poll;

        loop {
            self.transition(SchedulerState::Waiting);
            if !self.wait_until_ready(&window, increment).await || self.shutdown_requested() {
                info!(window = %window, "Shutdown requested - stopping before fetch");
                break;
            }

            self.transition(SchedulerState::Fetching);
            let outcome = self.cycle.execute(&window).await;
            summary.windows_attempted += 1;
            summary.last_window = Some(window);
            if outcome.result.is_success() {
                summary.windows_succeeded += 1;
            }
            metrics::record_window(outcome.label());

            if self.config.checkpoint_enabled() && outcome.should_checkpoint() {
                self.transition(SchedulerState::Persisting);
                self.persist(&window);
            }

            if stop_after_first {
                break;
            }
            window = window.next(self.config.query_length)?;
            increment = self.config.poll_interval;
        }

        self.transition(SchedulerState::Terminated);
        info!(
            attempted = summary.windows_attempted,
            succeeded = summary.windows_succeeded,
            "Poller finished"
        );
        Ok(summary)
    }

    fn persist(&self, window: &TimeWindow) {
        let value = window.to_date();
        match self.checkpoints.save(&value) {
            Ok(()) => metrics::record_checkpoint_write(true),
            Err(e) => {
                metrics::record_checkpoint_write(false);
                error!(checkpoint = %value, error = %e, "Failed to save checkpoint");
            }
        }
    }

    /// Sleep in `increment` steps until `window` is ready.
    ///
    /// Returns `false` if shutdown was requested while waiting.
    async fn wait_until_ready(&self, window: &TimeWindow, increment: Duration) -> bool {
        loop {
            let Some(remaining) = remaining_wait(self.clock.now(), window, &self.config) else {
                return true;
            };
            if self.shutdown_requested() {
                return false;
            }

            let step = if increment.is_zero() {
                remaining
            } else {
                remaining.min(increment)
            };
            debug!(
                window = %window,
                remaining_secs = remaining.as_secs(),
                sleep_ms = step.as_millis(),
                "Window not ready yet"
            );

            if let Some(shutdown) = &self.shutdown {
                tokio::select! {
                    _ = self.clock.sleep(step) => {},
                    _ = shutdown.wait_for_shutdown() => return false,
                }
            } else {
                self.clock.sleep(step).await;
            }
        }
    }
}
