//! One request for one window, and persistence of whatever came back

use super::window::TimeWindow;
use crate::fetcher::{ComplianceQuery, ComplianceSource, FetchResult, FetchStatus, RequestFilters};
use crate::output::OutputStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// What happened to the payload of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDisposition {
    /// Payload written to this file
    Written(PathBuf),
    /// No payload to write
    Skipped,
    /// Writing failed
    Failed(String),
}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Classified response
    pub result: FetchResult,
    /// Output file handling
    pub output: OutputDisposition,
}

impl CycleOutcome {
    /// The window may be recorded as done: any 200, even if the body could not be written
    pub fn should_checkpoint(&self) -> bool {
        self.result.is_success()
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match (&self.result.status, &self.output) {
            (_, OutputDisposition::Failed(_)) => "output_error",
            (FetchStatus::Success, _) => "success",
            (FetchStatus::HttpError(_), _) => "http_error",
            (FetchStatus::TransportError, _) => "transport_error",
        }
    }
}

/// Fetches one window and writes the body under the outbox
pub struct FetchCycle {
    source: Arc<dyn ComplianceSource>,
    output: OutputStore,
    filters: RequestFilters,
}

impl FetchCycle {
    /// Cycle over `source`, writing into `output`
    pub fn new(source: Arc<dyn ComplianceSource>, output: OutputStore, filters: RequestFilters) -> Self {
        Self {
            source,
            output,
            filters,
        }
    }

    /// Query sent for `window`
    pub fn query_for(&self, window: &TimeWindow) -> ComplianceQuery {
        ComplianceQuery {
            from_date: window.from_date(),
            to_date: window.to_date(),
            filters: self.filters.clone(),
        }
    }

    /// Issue exactly one request for `window` and persist any payload.
    ///
    /// Never fails: every problem is logged and reflected in the outcome.
    pub async fn execute(&self, window: &TimeWindow) -> CycleOutcome {
        let query = self.query_for(window);
        info!(
            window = %window,
            endpoint = self.source.endpoint(),
            "Requesting compliance data"
        );

        let result = self.source.fetch(&query).await;
        match result.status {
            FetchStatus::Success => {}
            FetchStatus::HttpError(code) => {
                error!(window = %window, status = code, "Compliance endpoint returned an error")
            }
            FetchStatus::TransportError => {
                error!(window = %window, "No response from compliance endpoint")
            }
        }

        let output = match &result.payload {
            None => OutputDisposition::Skipped,
            Some(payload) => match self.output.write(window.start(), payload) {
                Ok(path) => {
                    info!(
                        window = %window,
                        path = %path.display(),
                        bytes = payload.len(),
                        "Payload written"
                    );
                    OutputDisposition::Written(path)
                }
                Err(e) => {
                    error!(window = %window, error = %e, "Failed to write payload");
                    OutputDisposition::Failed(e.to_string())
                }
            },
        };

        CycleOutcome { result, output }
    }
}
