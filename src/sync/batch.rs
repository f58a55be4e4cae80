//! Sync batches: a group of message ids delivered in one call.

use crate::model::{Generation, MessageId};
use std::collections::BTreeSet;
use std::fmt;
use tokio::time::Instant;

/// Monotonic batch identifier. Also the batch's creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

impl BatchId {
    /// Create from a raw sequence number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Delivery state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Collecting ids until its debounce deadline passes.
    Pending {
        /// Earliest dispatch time.
        deadline: Instant,
    },
    /// A delivery attempt is outstanding.
    InFlight,
    /// The server acknowledged the batch.
    Acked,
    /// The last attempt failed; retry once `retry_at` passes.
    Failed {
        /// Earliest retry time.
        retry_at: Instant,
    },
}

impl BatchState {
    /// Pending or in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, BatchState::Pending { .. } | BatchState::InFlight)
    }

    /// Not yet acknowledged.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, BatchState::Acked)
    }

    /// When the batch may next be dispatched, if it is waiting for a time.
    pub fn due_at(&self) -> Option<Instant> {
        match self {
            BatchState::Pending { deadline } => Some(*deadline),
            BatchState::Failed { retry_at } => Some(*retry_at),
            BatchState::InFlight | BatchState::Acked => None,
        }
    }

    /// Short label for logs and snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            BatchState::Pending { .. } => "pending",
            BatchState::InFlight => "in_flight",
            BatchState::Acked => "acked",
            BatchState::Failed { .. } => "failed",
        }
    }
}

/// A set of ids pending delivery, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBatch {
    id: BatchId,
    generation: Generation,
    ids: BTreeSet<MessageId>,
    state: BatchState,
    attempts: u32,
}

impl SyncBatch {
    /// New pending batch.
    pub fn pending(
        id: BatchId,
        generation: Generation,
        ids: BTreeSet<MessageId>,
        deadline: Instant,
    ) -> Self {
        Self {
            id,
            generation,
            ids,
            state: BatchState::Pending { deadline },
            attempts: 0,
        }
    }

    /// Batch id.
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Generation the batch was created under.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Ids carried by the batch.
    pub fn ids(&self) -> &BTreeSet<MessageId> {
        &self.ids
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Delivery attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether `id` is carried by this batch.
    pub fn contains(&self, id: MessageId) -> bool {
        self.ids.contains(&id)
    }

    /// Whether the batch may be dispatched at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.state.due_at().is_some_and(|at| at <= now)
    }

    /// Add ids to a pending batch. Ignored in any other state.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = MessageId>) {
        if matches!(self.state, BatchState::Pending { .. }) {
            self.ids.extend(ids);
        }
    }

    /// Pending/Failed → InFlight.
    pub fn start_attempt(&mut self) {
        debug_assert!(self.state.due_at().is_some(), "dispatching a {} batch", self.state.label());
        self.state = BatchState::InFlight;
        self.attempts += 1;
    }

    /// InFlight → Acked.
    pub fn acknowledge(&mut self) {
        self.state = BatchState::Acked;
    }

    /// InFlight → Failed.
    pub fn fail(&mut self, retry_at: Instant) {
        self.state = BatchState::Failed { retry_at };
    }
}

/// Read-only view of a batch for snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchView {
    /// Batch id.
    pub id: BatchId,
    /// Generation the batch belongs to.
    pub generation: Generation,
    /// Ids carried.
    pub ids: BTreeSet<MessageId>,
    /// Current state.
    pub state: BatchState,
    /// Attempts started.
    pub attempts: u32,
}

impl From<&SyncBatch> for BatchView {
    fn from(batch: &SyncBatch) -> Self {
        Self {
            id: batch.id,
            generation: batch.generation,
            ids: batch.ids.clone(),
            state: batch.state,
            attempts: batch.attempts,
        }
    }
}
