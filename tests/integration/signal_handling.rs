use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use compliance_poller::clock::SystemClock;
use compliance_poller::config::{RunConfiguration, RunMode, StartSpec};
use compliance_poller::fetcher::{ComplianceQuery, ComplianceSource, FetchResult, RequestFilters};
use compliance_poller::output::OutputStore;
use compliance_poller::poller::{FetchCycle, Scheduler, SchedulerState};
use compliance_poller::resume::CheckpointStore;
use compliance_poller::shutdown::ShutdownCoordinator;
use compliance_poller::timestamp::format_canonical;
use tempfile::TempDir;

#[tokio::test]
async fn shutdown_notifies_waiters() {
    let shutdown = ShutdownCoordinator::shared();
    let waiter = {
        let handle = shutdown.clone();
        tokio::spawn(async move {
            handle.wait_for_shutdown().await;
            true
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.request_shutdown();

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
    assert!(result.is_ok());
}

/// A request that lands before the waiter registers must not be missed.
#[tokio::test]
async fn shutdown_requested_before_wait_returns_immediately() {
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let handle = shutdown.clone();
    let waiter = tokio::spawn(async move {
        handle.wait_for_shutdown().await;
        true
    });

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
    assert!(result.is_ok(), "wait_for_shutdown() hung although shutdown was already requested");
}

#[tokio::test]
async fn shutdown_concurrent_waiters_all_notified() {
    let shutdown = ShutdownCoordinator::shared();

    let mut waiters = Vec::new();
    for _ in 0..10 {
        let handle = shutdown.clone();
        waiters.push(tokio::spawn(async move {
            handle.wait_for_shutdown().await;
        }));
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    shutdown.request_shutdown();

    for waiter in waiters {
        let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(result.is_ok(), "A waiter was not notified of shutdown");
    }
}

struct NeverCalled;

#[async_trait]
impl ComplianceSource for NeverCalled {
    async fn fetch(&self, _query: &ComplianceQuery) -> FetchResult {
        panic!("fetch must not run after shutdown");
    }

    fn endpoint(&self) -> &str {
        "never"
    }
}

/// A scheduler sleeping toward a window that is minutes away stops as soon as
/// shutdown is requested, without fetching.
#[tokio::test(start_paused = true)]
async fn scheduler_stops_during_wait() {
    let dir = TempDir::new().unwrap();
    let start = Utc::now() - TimeDelta::minutes(1);
    let config = RunConfiguration {
        run_mode: RunMode::Continuous,
        start: StartSpec::Explicit(format_canonical(start)),
        ..RunConfiguration::default()
    };
    let cycle = FetchCycle::new(
        Arc::new(NeverCalled),
        OutputStore::new(dir.path().join("data")),
        RequestFilters::default(),
    );
    let shutdown = ShutdownCoordinator::shared();
    let mut scheduler = Scheduler::new(
        config,
        cycle,
        CheckpointStore::new(dir.path().join("start_time.dat")),
        SystemClock::shared(),
    )
    .with_shutdown(shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(95)).await;
            shutdown.request_shutdown();
        }
    });

    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.windows_attempted, 0);
    assert_eq!(scheduler.state(), SchedulerState::Terminated);
}
