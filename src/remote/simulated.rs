//! In-process stand-in for the chat server.
//!
//! Records every call with a wall-clock timestamp. Can be told to fail every
//! N-th mark-as-read call so the retry path gets exercised end to end.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Mutex;

use super::{PresenceService, ReadReceiptService, RemoteError, Session};
use crate::model::MessageId;

/// Result of one recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The call succeeded.
    Accepted,
    /// The call was failed on purpose.
    Failed,
}

/// One recorded mark-as-read call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRecord {
    /// 1-based call number.
    pub call: u32,
    /// Ids carried by the call.
    pub ids: Vec<MessageId>,
    /// What the server answered.
    pub outcome: DeliveryOutcome,
    /// When the call arrived.
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Ledger {
    deliveries: Vec<DeliveryRecord>,
    read: BTreeSet<MessageId>,
    presence_calls: u32,
}

/// Simulated server implementing both outbound services.
#[derive(Debug, Default)]
pub struct SimulatedServer {
    fail_every: Option<u32>,
    ledger: Mutex<Ledger>,
}

impl SimulatedServer {
    /// Server that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Server that fails every `n`-th mark-as-read call (`n >= 1`; `None` or
    /// `Some(0)` never fails).
    pub fn failing_every(n: Option<u32>) -> Self {
        Self {
            fail_every: n.filter(|n| *n > 0),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Every mark-as-read call so far, in arrival order.
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        self.with_ledger(|ledger| ledger.deliveries.clone())
    }

    /// Ids the server holds as read.
    pub fn read_ids(&self) -> BTreeSet<MessageId> {
        self.with_ledger(|ledger| ledger.read.clone())
    }

    /// Number of presence registrations received.
    pub fn presence_calls(&self) -> u32 {
        self.with_ledger(|ledger| ledger.presence_calls)
    }

    fn with_ledger<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        // A poisoned ledger only means a recording panicked; the data is still usable.
        let mut guard = match self.ledger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl ReadReceiptService for SimulatedServer {
    async fn queue_mark_as_read(
        &self,
        _session: &Session,
        ids: &[MessageId],
    ) -> Result<(), RemoteError> {
        let fail_every = self.fail_every;
        self.with_ledger(|ledger| {
            let call = ledger.deliveries.len() as u32 + 1;
            let fail = fail_every.is_some_and(|n| call % n == 0);
            let outcome = if fail {
                DeliveryOutcome::Failed
            } else {
                ledger.read.extend(ids.iter().copied());
                DeliveryOutcome::Accepted
            };
            ledger.deliveries.push(DeliveryRecord {
                call,
                ids: ids.to_vec(),
                outcome,
                at: Utc::now(),
            });
            if fail {
                Err(RemoteError::Rejected {
                    status: 503,
                    message: format!("simulated failure on call {call}"),
                })
            } else {
                Ok(())
            }
        })
    }
}

#[async_trait]
impl PresenceService for SimulatedServer {
    async fn register_activity(&self, _session: &Session) -> Result<(), RemoteError> {
        self.with_ledger(|ledger| ledger.presence_calls += 1);
        Ok(())
    }
}
