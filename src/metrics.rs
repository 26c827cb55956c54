//! Poller metrics
//!
//! Emitted through the `metrics` facade; without an installed recorder every
//! call is a no-op. `init_metrics` installs a Prometheus exporter with a
//! scrape endpoint.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter listening on `addr`.
///
/// Idempotent: later calls are ignored.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "compliance_requests_total",
        Unit::Count,
        "Requests made to the compliance endpoint, by status"
    );
    describe_histogram!(
        "compliance_request_duration_seconds",
        Unit::Seconds,
        "Compliance request duration"
    );
    describe_counter!(
        "compliance_windows_total",
        Unit::Count,
        "Windows processed, by outcome"
    );
    describe_counter!(
        "compliance_checkpoint_writes_total",
        Unit::Count,
        "Checkpoint writes, by result"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!(%addr, "Metrics endpoint listening");
    Ok(())
}

/// Whether an exporter has been installed
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.get().is_some()
}

/// Times one compliance request
pub struct RequestMetrics {
    start_time: Instant,
}

impl RequestMetrics {
    /// Start timing
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// A response with `status_code` was received
    pub fn record_status(&self, status_code: u16) {
        self.record(status_code.to_string());
    }

    /// No response was obtained
    pub fn record_transport_error(&self) {
        self.record("transport_error".to_string());
    }

    fn record(&self, status: String) {
        let duration = self.start_time.elapsed();
        counter!("compliance_requests_total", "status" => status.clone()).increment(1);
        histogram!("compliance_request_duration_seconds").record(duration.as_secs_f64());
        debug!(
            status = %status,
            duration_ms = duration.as_millis(),
            "Compliance request completed"
        );
    }
}

/// Count a processed window
pub fn record_window(outcome: &'static str) {
    counter!("compliance_windows_total", "outcome" => outcome).increment(1);
}

/// Count a checkpoint write attempt
pub fn record_checkpoint_write(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("compliance_checkpoint_writes_total", "result" => result).increment(1);
}
