// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for the controller loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::generator::Generator;
use crate::reconciler::ReconcilerConfig;
use crate::scheduler::{BackoffPolicy, PassState, SchedulePolicy};
use crate::store::MemoryStore;

const GROUP: &str = "example.io";
const HOUR: Duration = Duration::from_secs(3600);

fn policy(interval: Duration) -> SchedulePolicy {
    SchedulePolicy {
        steady_interval: interval,
        heal_interval: interval,
        backoff: BackoffPolicy {
            initial: interval,
            max: interval,
            multiplier: 2,
        },
    }
}

fn controller(store: &Arc<MemoryStore>, interval: Duration, call_timeout: Duration) -> Controller {
    let reconciler = Reconciler::new(
        store.clone(),
        Generator::default(),
        policy(interval),
        ReconcilerConfig {
            max_concurrency: 4,
            call_timeout,
        },
    );
    Controller::new(Arc::new(reconciler), Catalog::range(1, 3), GROUP)
}

fn name(index: u32) -> String {
    Generator::default().name_for(index, GROUP)
}

async fn next_report(rx: &mut watch::Receiver<Option<PassReport>>) -> PassReport {
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("report within deadline")
        .expect("controller alive");
    rx.borrow_and_update().clone().expect("report published")
}

#[test]
fn test_trigger_relevance() {
    let store = Arc::new(MemoryStore::new());
    let controller = controller(&store, HOUR, Duration::from_secs(1));
    assert!(controller.is_relevant(&Trigger::Resync));
    assert!(controller.is_relevant(&Trigger::Changed { name: name(2) }));
    assert!(!controller.is_relevant(&Trigger::Changed { name: name(4) }));
    assert!(!controller.is_relevant(&Trigger::Changed {
        name: "widgets2.other.io".into()
    }));
}

#[tokio::test]
async fn test_first_pass_runs_immediately() {
    let store = Arc::new(MemoryStore::new());
    let handle = controller(&store, HOUR, Duration::from_secs(1)).spawn(CancellationToken::new());
    let mut reports = handle.reports();

    let report = next_report(&mut reports).await;
    assert_eq!(report.state, PassState::Healed);
    assert_eq!(report.created, vec![name(1), name(2), name(3)]);
    assert_eq!(report.group, GROUP);
    assert_eq!(report.next_delay(), HOUR);
    assert_eq!(handle.latest(), Some(report));

    handle.shutdown().await.expect("clean exit");
}

#[tokio::test]
async fn test_relevant_trigger_heals_before_timer() {
    let store = Arc::new(MemoryStore::new());
    let handle = controller(&store, HOUR, Duration::from_secs(1)).spawn(CancellationToken::new());
    let mut reports = handle.reports();
    next_report(&mut reports).await;

    store.remove(&name(2));
    assert!(handle.notify(Trigger::Changed { name: name(2) }).await);

    let report = next_report(&mut reports).await;
    assert_eq!(report.state, PassState::Healed);
    assert_eq!(report.created, vec![name(2)]);
    assert!(store.contains(&name(2)));

    assert!(handle.notify(Trigger::Resync).await);
    assert_eq!(next_report(&mut reports).await.state, PassState::Idle);

    handle.shutdown().await.expect("clean exit");
}

#[tokio::test]
async fn test_irrelevant_trigger_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    let handle = controller(&store, HOUR, Duration::from_secs(1)).spawn(CancellationToken::new());
    let mut reports = handle.reports();
    next_report(&mut reports).await;

    assert!(handle.notify(Trigger::Changed { name: name(9) }).await);
    let waited = tokio::time::timeout(Duration::from_millis(200), reports.changed()).await;
    assert!(waited.is_err(), "no pass expected for a name outside the catalog");

    handle.shutdown().await.expect("clean exit");
}

#[tokio::test]
async fn test_closed_trigger_channel_keeps_timer() {
    let store = Arc::new(MemoryStore::new());
    let controller = controller(&store, Duration::from_millis(30), Duration::from_secs(1));
    let (trigger_tx, trigger_rx) = mpsc::channel(1);
    drop(trigger_tx);
    let (report_tx, mut reports) = watch::channel(None);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(controller.run(trigger_rx, report_tx, shutdown.clone()));

    let first = next_report(&mut reports).await;
    let second = next_report(&mut reports).await;
    assert_ne!(first.pass_id, second.pass_id);
    assert_eq!(second.state, PassState::Idle);

    shutdown.cancel();
    task.await.expect("clean exit");
}

#[tokio::test]
async fn test_shutdown_interrupts_pass_in_flight() {
    let store = Arc::new(MemoryStore::new());
    store.set_latency(Some(Duration::from_secs(30)));
    let handle = controller(&store, HOUR, Duration::from_secs(60)).spawn(CancellationToken::new());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.latest().is_none());

    tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
        .await
        .expect("shutdown should not wait for the store")
        .expect("clean exit");
}

#[tokio::test]
async fn test_report_saturates_oversized_durations() {
    let store = Arc::new(MemoryStore::new());
    let reconciler = Reconciler::new(
        store,
        Generator::default(),
        policy(Duration::from_secs(60)),
        ReconcilerConfig::default(),
    );
    let mut result = reconciler.reconcile(&Catalog::range(1, 2), GROUP).await;
    result.next_delay = Duration::MAX;

    let report = PassReport::new(&result, GROUP, chrono::Utc::now(), Duration::MAX);
    assert_eq!(report.duration_ms, u64::MAX);
    assert_eq!(report.next_delay_ms, u64::MAX);
    assert_eq!(report.summary.created, 2);

    let report = PassReport::new(&result, GROUP, chrono::Utc::now(), Duration::from_millis(1500));
    assert_eq!(report.duration_ms, 1500);
}
