use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::errors::FundClientError;

/// Cancellable snapshot subscription over one data source.
///
/// One background task owns the snapshot: it rebuilds it immediately on
/// spawn, then on every interval tick and on every manual trigger, and
/// publishes each result wholesale through a watch channel, so consumers
/// never observe a half-updated list. `shutdown` (or dropping the watcher)
/// cancels the task; no timer outlives its consumer.
pub struct SnapshotWatcher<T> {
    snapshot_rx: watch::Receiver<Arc<Vec<T>>>,
    trigger_tx: mpsc::Sender<oneshot::Sender<()>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> SnapshotWatcher<T> {
    /// Start a watcher that rebuilds via `fetch` every `interval` and on
    /// demand. The first pass runs immediately.
    pub fn spawn<F, Fut>(interval: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<T>> + Send,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Vec::new()));
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<oneshot::Sender<()>>(8);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let ack: Option<oneshot::Sender<()>> = tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => None,
                    trigger = trigger_rx.recv() => match trigger {
                        Some(ack) => Some(ack),
                        None => break,
                    },
                };

                let next = fetch().await;
                debug!(entries = next.len(), "Publishing snapshot");
                if snapshot_tx.send(Arc::new(next)).is_err() {
                    break;
                }
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            debug!("Snapshot watcher stopped");
        });

        Self { snapshot_rx, trigger_tx, cancel, task }
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<Vec<T>> {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch-channel handle for change notifications.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.snapshot_rx.clone()
    }

    /// Run a refresh pass now; completes only once the resulting snapshot
    /// has been published. Called after every state-changing transaction.
    pub async fn refresh_now(&self) -> Result<(), FundClientError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.trigger_tx
            .send(ack_tx)
            .await
            .map_err(|_| FundClientError::Refresh("snapshot watcher is stopped".to_string()))?;
        ack_rx
            .await
            .map_err(|_| FundClientError::Refresh("snapshot watcher stopped mid-refresh".to_string()))
    }

    /// Stop the background task. Dropping the watcher has the same effect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for SnapshotWatcher<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
