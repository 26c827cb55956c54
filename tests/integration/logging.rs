//! Integration tests for logging and tracing

use chrono::{TimeZone, Utc};
use compliance_poller::fetcher::{ComplianceQuery, ComplianceSource, FetchResult, RequestFilters};
use compliance_poller::logging::{self, LogFormat};
use compliance_poller::output::OutputStore;
use compliance_poller::poller::{FetchCycle, TimeWindow};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

struct Unavailable;

#[async_trait::async_trait]
impl ComplianceSource for Unavailable {
    async fn fetch(&self, _query: &ComplianceQuery) -> FetchResult {
        FetchResult::response(503, "try later")
    }

    fn endpoint(&self) -> &str {
        "unavailable"
    }
}

fn json_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn json_file_subscriber(path: &Path, filter: &str) -> Box<dyn tracing::Subscriber + Send + Sync> {
    let file = logging::open_log_file(path).unwrap();
    logging::subscriber(Mutex::new(file), false, LogFormat::Json, EnvFilter::new(filter))
}

#[test]
fn test_log_format_selection() {
    assert_eq!(LogFormat::from_value(Some("json")), LogFormat::Json);
    assert_eq!(LogFormat::from_value(Some("JSON")), LogFormat::Json);
    assert_eq!(LogFormat::from_value(Some("text")), LogFormat::Text);
    assert_eq!(LogFormat::from_value(Some("")), LogFormat::Text);
    assert_eq!(LogFormat::from_value(None), LogFormat::Text);
}

#[test]
fn test_json_lines_written_to_log_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs/nested/poller.log");

    let subscriber = json_file_subscriber(&path, "compliance_poller=info");
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "compliance_poller::poller", window = "[a, b)", "Window ready");
        tracing::debug!(target: "compliance_poller::poller", "Filtered out");
        tracing::warn!(target: "other_crate", "Not ours");
    });

    let lines = json_lines(&path);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "INFO");
    assert_eq!(lines[0]["target"], "compliance_poller::poller");
    assert_eq!(lines[0]["fields"]["message"], "Window ready");
    assert_eq!(lines[0]["fields"]["window"], "[a, b)");
}

#[test]
fn test_log_file_is_appended() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poller.log");
    std::fs::write(&path, "{\"earlier\":true}\n").unwrap();

    let subscriber = json_file_subscriber(&path, "compliance_poller=info");
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "compliance_poller", "Later");
    });

    let lines = json_lines(&path);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["earlier"], true);
    assert_eq!(lines[1]["fields"]["message"], "Later");
}

#[test]
fn test_log_file_under_regular_file_cannot_be_opened() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    assert!(logging::open_log_file(&blocker.join("poller.log")).is_err());
}

#[tokio::test]
async fn test_cycle_logs_http_error() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("poller.log");
    let _guard = tracing::subscriber::set_default(json_file_subscriber(
        &log_path,
        "compliance_poller=trace",
    ));

    let cycle = FetchCycle::new(
        Arc::new(Unavailable),
        OutputStore::new(dir.path().join("data")),
        RequestFilters::default(),
    );
    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2013, 11, 15, 15, 46, 0).unwrap(),
        Utc.with_ymd_and_hms(2013, 11, 15, 15, 56, 0).unwrap(),
    )
    .unwrap();

    let outcome = cycle.execute(&window).await;
    assert!(!outcome.result.is_success());

    let lines = json_lines(&log_path);
    let http_error = lines
        .iter()
        .find(|line| line["fields"]["message"] == "Compliance endpoint returned an error")
        .unwrap();
    assert_eq!(http_error["level"], "ERROR");
    assert_eq!(http_error["fields"]["status"], 503);
}
