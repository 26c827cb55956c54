//! End-to-end cycles against a local mock of the compliance endpoint

use chrono::{TimeZone, Utc};
use compliance_poller::clock::ManualClock;
use compliance_poller::config::{RunConfiguration, StartSpec};
use compliance_poller::fetcher::{
    ComplianceHttpClient, ComplianceQuery, ComplianceSource, Credentials, EndpointConfig,
    FetchStatus, RequestFilters,
};
use compliance_poller::output::OutputStore;
use compliance_poller::poller::{FetchCycle, OutputDisposition, Scheduler, TimeWindow};
use compliance_poller::resume::CheckpointStore;
use compliance_poller::shutdown::ShutdownCoordinator;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PATH: &str = "/accounts/acme/publishers/twitter/compliance.json";

fn client(base_url: String) -> ComplianceHttpClient {
    let endpoint = EndpointConfig {
        base_url,
        publisher: "twitter".to_string(),
        timeout: Duration::from_secs(5),
    };
    let credentials = Credentials {
        account_name: "acme".to_string(),
        user_name: "ops".to_string(),
        password: "secret".to_string(),
    };
    ComplianceHttpClient::new(&endpoint, credentials).unwrap()
}

fn window_query(from: &str, to: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("fromDate".into(), from.into()),
        Matcher::UrlEncoded("toDate".into(), to.into()),
    ])
}

/// Resume-mode run over `[201311191200, 201311191210)` against `server`.
async fn resume_run(server: &mockito::ServerGuard, dir: &TempDir) -> CheckpointStore {
    resume_run_into(server, dir, dir.path().join("data")).await
}

async fn resume_run_into(
    server: &mockito::ServerGuard,
    dir: &TempDir,
    out_box: std::path::PathBuf,
) -> CheckpointStore {
    let checkpoints = CheckpointStore::new(dir.path().join("start_time.dat"));
    checkpoints.save("201311191200").unwrap();

    let cycle = FetchCycle::new(
        Arc::new(client(format!("{}/accounts/", server.url()))),
        OutputStore::new(out_box),
        RequestFilters::default(),
    );
    let config = RunConfiguration {
        start: StartSpec::Checkpoint,
        ..RunConfiguration::default()
    };
    let clock = ManualClock::shared(Utc.with_ymd_and_hms(2013, 11, 20, 12, 0, 0).unwrap());
    let mut scheduler = Scheduler::new(config, cycle, checkpoints.clone(), clock)
        .with_shutdown(ShutdownCoordinator::shared());

    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.windows_attempted, 1);
    checkpoints
}

#[tokio::test]
async fn test_http_request_shape() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("fromDate".into(), "201311151546".into()),
            Matcher::UrlEncoded("toDate".into(), "201311151556".into()),
            Matcher::UrlEncoded("product".into(), "decahose".into()),
            Matcher::UrlEncoded("label".into(), "prod".into()),
        ]))
        // ops:secret
        .match_header("authorization", "Basic b3BzOnNlY3JldA==")
        .match_header("accept", "application/json")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let source = client(format!("{}/accounts/", server.url()));
    let query = ComplianceQuery {
        from_date: "201311151546".to_string(),
        to_date: "201311151556".to_string(),
        filters: RequestFilters {
            product: Some("decahose".to_string()),
            stream_type: None,
            label: Some("prod".to_string()),
        },
    };

    let result = source.fetch(&query).await;

    mock.assert_async().await;
    assert_eq!(result.status, FetchStatus::Success);
    assert_eq!(result.payload.as_deref(), Some(&b"[]"[..]));
}

#[tokio::test]
async fn test_service_unavailable_body_persisted_checkpoint_unchanged() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(window_query("201311191200", "201311191210"))
        .with_status(503)
        .with_body("{\"error\":\"Service Unavailable\"}")
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();

    let checkpoints = resume_run(&server, &dir).await;

    mock.assert_async().await;
    assert_eq!(checkpoints.load().as_deref(), Some("201311191200"));
    let written = dir
        .path()
        .join("data/2013/11/19/12/compliance-2013-11-19-12.json");
    assert_eq!(
        std::fs::read_to_string(written).unwrap(),
        "{\"error\":\"Service Unavailable\"}"
    );
}

#[tokio::test]
async fn test_success_in_resume_mode_advances_checkpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(window_query("201311191200", "201311191210"))
        .with_status(200)
        .with_body("[{\"id\":\"1\"}]")
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();

    let checkpoints = resume_run(&server, &dir).await;

    mock.assert_async().await;
    assert_eq!(checkpoints.load().as_deref(), Some("201311191210"));
}

#[tokio::test]
async fn test_success_advances_checkpoint_when_output_write_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(window_query("201311191200", "201311191210"))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();
    let out_box = dir.path().join("data");
    std::fs::write(&out_box, "not a directory").unwrap();

    let checkpoints = resume_run_into(&server, &dir, out_box.clone()).await;

    mock.assert_async().await;
    assert_eq!(checkpoints.load().as_deref(), Some("201311191210"));
    assert!(out_box.is_file());
}

#[tokio::test]
async fn test_unreachable_endpoint_writes_nothing() {
    let dir = TempDir::new().unwrap();
    // Nothing listens on port 9 on the loopback interface
    let cycle = FetchCycle::new(
        Arc::new(client("http://127.0.0.1:9/accounts/".to_string())),
        OutputStore::new(dir.path().join("data")),
        RequestFilters::default(),
    );
    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2013, 11, 19, 12, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2013, 11, 19, 12, 10, 0).unwrap(),
    )
    .unwrap();

    let outcome = cycle.execute(&window).await;

    assert_eq!(outcome.result.status, FetchStatus::TransportError);
    assert_eq!(outcome.output, OutputDisposition::Skipped);
    assert!(!outcome.should_checkpoint());
    assert!(!dir.path().join("data").exists());
}
