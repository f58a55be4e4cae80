//! The sync worker: sole owner of batch bookkeeping.
//!
//! Runs as one task per conversation view. Network calls are spawned as
//! separate tasks and report back over a completion channel, so the worker
//! never awaits the server and a stuck call cannot stall a newer generation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::batch::{BatchId, BatchState, BatchView, SyncBatch};
use super::queue::{QueueSnapshot, QueueStats};
use super::SyncConfig;
use crate::model::{Generation, MessageId};
use crate::remote::{ReadReceiptHandle, RemoteError, Session};

/// Messages from the queue handle to the worker.
pub(super) enum Command {
    Enqueue {
        ids: Vec<MessageId>,
        generation: Generation,
    },
    SwitchGeneration(Generation),
    Snapshot(oneshot::Sender<QueueSnapshot>),
    WaitIdle(oneshot::Sender<()>),
}

/// Result of one delivery attempt.
pub(super) struct Completion {
    batch: BatchId,
    generation: Generation,
    result: Result<(), RemoteError>,
}

pub(super) struct QueueWorker {
    service: ReadReceiptHandle,
    session: Session,
    config: SyncConfig,
    generation: Generation,
    next_batch: BatchId,
    /// Undelivered batches, in creation order.
    batches: Vec<SyncBatch>,
    /// Consecutive failures in the current generation.
    failures: u32,
    rng: StdRng,
    stats: QueueStats,
    idle_waiters: Vec<oneshot::Sender<()>>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl QueueWorker {
    pub(super) fn new(
        service: ReadReceiptHandle,
        session: Session,
        config: SyncConfig,
        generation: Generation,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completions, completion_rx) = mpsc::unbounded_channel();
        let worker = Self {
            service,
            session,
            config,
            generation,
            next_batch: BatchId::new(1),
            batches: Vec::new(),
            failures: 0,
            rng: StdRng::from_os_rng(),
            stats: QueueStats::default(),
            idle_waiters: Vec::new(),
            completions,
        };
        (worker, completion_rx)
    }

    pub(super) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let wake = self.next_wakeup();
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = completions.recv() => self.handle_completion(completion),
                () = sleep_until_opt(wake) => {}
            }
            self.dispatch_due();
            self.notify_if_idle();
        }

        if !self.batches.is_empty() {
            debug!(
                generation = %self.generation,
                batches = self.batches.len(),
                "sync worker stopped with undelivered batches"
            );
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Enqueue { ids, generation } => self.enqueue(ids, generation),
            Command::SwitchGeneration(generation) => self.switch_generation(generation),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::WaitIdle(reply) => self.idle_waiters.push(reply),
        }
    }

    fn enqueue(&mut self, ids: Vec<MessageId>, generation: Generation) {
        if generation != self.generation {
            self.stats.stale_enqueues_dropped += 1;
            debug!(
                generation = %generation,
                current = %self.generation,
                ids = ids.len(),
                "dropping enqueue for stale generation"
            );
            return;
        }

        let requested: BTreeSet<MessageId> = ids.into_iter().collect();
        let requested_count = requested.len();
        let fresh: BTreeSet<MessageId> = requested
            .into_iter()
            .filter(|id| !self.is_outstanding(*id))
            .collect();
        let duplicates = requested_count - fresh.len();
        self.stats.duplicate_ids_dropped += duplicates as u64;

        if fresh.is_empty() {
            debug!(duplicates, "enqueue carried only ids already queued");
            return;
        }
        self.stats.enqueued_ids += fresh.len() as u64;

        let fresh_count = fresh.len();
        if let Some(open) = self
            .batches
            .iter_mut()
            .find(|batch| matches!(batch.state(), BatchState::Pending { .. }))
        {
            open.extend(fresh);
            debug!(batch = %open.id(), added = fresh_count, duplicates, "coalesced into pending batch");
            return;
        }

        let id = self.next_batch;
        self.next_batch = id.next();
        let deadline = Instant::now() + self.config.debounce;
        self.batches
            .push(SyncBatch::pending(id, self.generation, fresh, deadline));
        debug!(
            batch = %id,
            generation = %self.generation,
            ids = fresh_count,
            duplicates,
            "opened pending batch"
        );
    }

    fn switch_generation(&mut self, generation: Generation) {
        if generation <= self.generation {
            debug!(
                generation = %generation,
                current = %self.generation,
                "ignoring switch to a generation that is not newer"
            );
            return;
        }

        let abandoned = self.batches.len();
        self.stats.abandoned_batches += abandoned as u64;
        self.batches.clear();
        self.failures = 0;
        debug!(
            from = %self.generation,
            to = %generation,
            abandoned,
            "generation switched"
        );
        self.generation = generation;
    }

    fn handle_completion(&mut self, completion: Completion) {
        let Completion {
            batch,
            generation,
            result,
        } = completion;

        if generation != self.generation {
            self.stats.stale_completions_ignored += 1;
            debug!(
                batch = %batch,
                generation = %generation,
                current = %self.generation,
                ok = result.is_ok(),
                "ignoring delivery result for stale generation"
            );
            return;
        }

        let Some(index) = self.batches.iter().position(|b| b.id() == batch) else {
            return;
        };

        match result {
            Ok(()) => {
                let mut delivered = self.batches.remove(index);
                delivered.acknowledge();
                self.failures = 0;
                self.stats.delivered_batches += 1;
                self.stats.delivered_ids += delivered.ids().len() as u64;
                info!(
                    batch = %batch,
                    generation = %generation,
                    ids = delivered.ids().len(),
                    attempts = delivered.attempts(),
                    "read receipts delivered"
                );
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                self.stats.failed_attempts += 1;
                let delay = self.config.backoff.delay(self.failures, &mut self.rng);
                let failed = &mut self.batches[index];
                failed.fail(Instant::now() + delay);
                warn!(
                    batch = %batch,
                    generation = %generation,
                    attempt = failed.attempts(),
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "read receipt delivery failed"
                );
            }
        }
    }

    /// Start the oldest due batch, unless a delivery is already in flight.
    fn dispatch_due(&mut self) {
        if self.has_in_flight() {
            return;
        }
        let now = Instant::now();
        let Some(batch) = self.batches.iter_mut().find(|batch| batch.is_due(now)) else {
            return;
        };

        batch.start_attempt();
        let batch_id = batch.id();
        let generation = batch.generation();
        let attempt = batch.attempts();
        let ids: Vec<MessageId> = batch.ids().iter().copied().collect();
        debug!(
            batch = %batch_id,
            generation = %generation,
            ids = ids.len(),
            attempt,
            "dispatching read receipts"
        );

        let service = Arc::clone(&self.service);
        let session = self.session.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = service.queue_mark_as_read(&session, &ids).await;
            let _ = completions.send(Completion {
                batch: batch_id,
                generation,
                result,
            });
        });
    }

    fn next_wakeup(&self) -> Option<Instant> {
        if self.has_in_flight() {
            return None;
        }
        self.batches
            .iter()
            .filter_map(|batch| batch.state().due_at())
            .min()
    }

    fn has_in_flight(&self) -> bool {
        self.batches
            .iter()
            .any(|batch| batch.state() == BatchState::InFlight)
    }

    fn is_outstanding(&self, id: MessageId) -> bool {
        self.batches.iter().any(|batch| batch.contains(id))
    }

    fn notify_if_idle(&mut self) {
        if self.batches.is_empty() {
            for waiter in self.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            generation: self.generation,
            batches: self.batches.iter().map(BatchView::from).collect(),
            stats: self.stats,
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
