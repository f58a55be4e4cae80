//! Read-receipt synchronization.
//!
//! Ids the local engine marks read are handed to a [`ReadSyncQueue`], which
//! delivers them to the server in the background:
//!
//! - rapid enqueues are coalesced into one batch over a debounce window
//! - an id already owned by an undelivered batch is not queued again
//! - failed batches are retried with capped exponential backoff
//! - switching generation (narrow) abandons everything still undelivered
//!
//! Delivery is at least once per id per generation while the generation
//! stays current. The server must treat repeated mark-read calls as no-ops.

pub mod backoff;
pub mod batch;
pub mod queue;
mod worker;

pub use backoff::BackoffPolicy;
pub use batch::{BatchId, BatchState, BatchView, SyncBatch};
pub use queue::{QueueSnapshot, QueueStats, ReadSyncQueue};

use std::time::Duration;

/// Tuning for a [`ReadSyncQueue`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// How long a new batch collects ids before it may be dispatched.
    pub debounce: Duration,
    /// Retry pacing after failures.
    pub backoff: BackoffPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            backoff: BackoffPolicy::default(),
        }
    }
}
