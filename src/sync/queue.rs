//! Handle to the per-conversation sync worker.

use std::collections::BTreeSet;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::batch::BatchView;
use super::worker::{Command, QueueWorker};
use super::SyncConfig;
use crate::model::{Generation, MessageId};
use crate::remote::{ReadReceiptHandle, Session};

/// Counters accumulated by the worker since it started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Distinct ids accepted into a batch.
    pub enqueued_ids: u64,
    /// Ids dropped because an undelivered batch already carried them.
    pub duplicate_ids_dropped: u64,
    /// Enqueue calls dropped because they named a stale generation.
    pub stale_enqueues_dropped: u64,
    /// Batches the server acknowledged.
    pub delivered_batches: u64,
    /// Ids carried by acknowledged batches.
    pub delivered_ids: u64,
    /// Delivery attempts that failed.
    pub failed_attempts: u64,
    /// Batches dropped undelivered by a generation switch.
    pub abandoned_batches: u64,
    /// Delivery results that arrived after their generation went stale.
    pub stale_completions_ignored: u64,
}

/// Point-in-time view of the worker's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Current generation.
    pub generation: Generation,
    /// Undelivered batches, in creation order.
    pub batches: Vec<BatchView>,
    /// Counters.
    pub stats: QueueStats,
}

impl QueueSnapshot {
    /// Every id owned by an undelivered batch.
    pub fn outstanding_ids(&self) -> BTreeSet<MessageId> {
        self.batches
            .iter()
            .flat_map(|batch| batch.ids.iter().copied())
            .collect()
    }
}

/// Background delivery queue for one conversation view.
///
/// All bookkeeping lives in a single worker task; this handle only sends it
/// commands, so [`ReadSyncQueue::enqueue`] returns immediately and never
/// waits on the network.
#[derive(Debug)]
pub struct ReadSyncQueue {
    commands: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl ReadSyncQueue {
    /// Start the worker for `generation`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        service: ReadReceiptHandle,
        session: Session,
        config: SyncConfig,
        generation: Generation,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (worker, completion_rx) = QueueWorker::new(service, session, config, generation);
        let worker = tokio::spawn(worker.run(command_rx, completion_rx));
        Self { commands, worker }
    }

    /// Queue ids for delivery under `generation`.
    ///
    /// Ids already owned by an undelivered batch are dropped; the whole call
    /// is dropped if `generation` is no longer current.
    pub fn enqueue<I>(&self, ids: I, generation: Generation)
    where
        I: IntoIterator<Item = MessageId>,
    {
        let ids: Vec<MessageId> = ids.into_iter().collect();
        if ids.is_empty() {
            return;
        }
        self.send(Command::Enqueue { ids, generation });
    }

    /// Make `generation` current, abandoning all undelivered work.
    ///
    /// Older generations than the current one are ignored.
    pub fn switch_generation(&self, generation: Generation) {
        self.send(Command::SwitchGeneration(generation));
    }

    /// Current bookkeeping, or `None` if the worker has stopped.
    pub async fn snapshot(&self) -> Option<QueueSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply));
        response.await.ok()
    }

    /// Resolve once no batch is undelivered (or the worker has stopped).
    ///
    /// Under sustained failures this waits for as long as retries keep
    /// failing.
    pub async fn wait_idle(&self) {
        let (reply, response) = oneshot::channel();
        self.send(Command::WaitIdle(reply));
        let _ = response.await;
    }

    /// Stop the worker. Undelivered batches are dropped.
    pub async fn shutdown(self) {
        let Self { commands, worker } = self;
        drop(commands);
        if let Err(err) = worker.await {
            debug!(error = %err, "sync worker ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("sync worker has stopped; command dropped");
        }
    }
}
