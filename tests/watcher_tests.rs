//! tests/watcher_tests.rs
//!
//! Snapshot watcher lifecycle: immediate first pass, manual trigger,
//! interval trigger, and teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use defi_fund_client::core::errors::FundClientError;
use defi_fund_client::refresh::SnapshotWatcher;

/// Watcher whose fetch counts its own invocations and publishes the count.
fn counting_watcher(interval: Duration) -> (SnapshotWatcher<usize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let fetch_count = count.clone();
    let watcher = SnapshotWatcher::spawn(interval, move || {
        let fetch_count = fetch_count.clone();
        async move {
            let pass = fetch_count.fetch_add(1, Ordering::SeqCst) + 1;
            vec![pass]
        }
    });
    (watcher, count)
}

const LONG_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::test(start_paused = true)]
async fn first_pass_runs_immediately_on_spawn() {
    let (watcher, count) = counting_watcher(LONG_INTERVAL);
    let mut rx = watcher.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(*watcher.current(), vec![1]);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_completes_after_publication() {
    let (watcher, count) = counting_watcher(LONG_INTERVAL);
    let mut rx = watcher.subscribe();
    rx.changed().await.unwrap();

    watcher.refresh_now().await.unwrap();
    assert_eq!(*watcher.current(), vec![2]);

    watcher.refresh_now().await.unwrap();
    assert_eq!(*watcher.current(), vec![3]);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn back_to_back_refreshes_of_stable_source_are_identical() {
    // Fetch that reads a fixed remote state.
    let watcher = SnapshotWatcher::spawn(LONG_INTERVAL, || async {
        vec!["GOLD".to_string(), "PROP".to_string()]
    });
    let mut rx = watcher.subscribe();
    rx.changed().await.unwrap();

    watcher.refresh_now().await.unwrap();
    let first = watcher.current();
    watcher.refresh_now().await.unwrap();
    let second = watcher.current();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn interval_tick_triggers_a_pass() {
    let (watcher, count) = counting_watcher(Duration::from_secs(30));
    let mut rx = watcher.subscribe();
    rx.changed().await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    rx.changed().await.unwrap();
    assert!(count.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_task_and_further_publications() {
    let (watcher, _count) = counting_watcher(Duration::from_secs(30));
    let mut rx = watcher.subscribe();
    rx.changed().await.unwrap();

    watcher.shutdown();
    while !watcher.is_stopped() {
        tokio::task::yield_now().await;
    }

    let err = watcher.refresh_now().await.unwrap_err();
    assert!(matches!(err, FundClientError::Refresh(_)));

    // The publishing side is gone; the channel reports closure instead of
    // new snapshots.
    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(rx.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_watcher_tears_the_task_down() {
    let (watcher, _count) = counting_watcher(Duration::from_secs(30));
    let mut rx = watcher.subscribe();
    rx.changed().await.unwrap();

    drop(watcher);
    assert!(rx.changed().await.is_err());
}
