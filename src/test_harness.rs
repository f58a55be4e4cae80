//! Test doubles for the outbound services.
//!
//! `RecordingService` records every mark-as-read call, answers from a script
//! of results (default: success), and can hold calls at a gate until the test
//! releases them. Used to observe the sync queue from the server's side.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::model::MessageId;
use crate::remote::{PresenceService, ReadReceiptService, RemoteError, Session};

/// One call as seen by the double.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub ids: Vec<MessageId>,
    pub at: Instant,
}

#[derive(Default)]
struct Inner {
    calls: Vec<RecordedCall>,
    script: VecDeque<Result<(), RemoteError>>,
    presence_calls: u32,
}

pub struct RecordingService {
    inner: Mutex<Inner>,
    gate: Option<Semaphore>,
}

impl RecordingService {
    /// Answers every call immediately with success.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            gate: None,
        })
    }

    /// Calls block until [`RecordingService::release`] hands out a permit.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            gate: Some(Semaphore::new(0)),
        })
    }

    /// Answers the next calls with `results`, in order, then success.
    pub fn with_script(self: &Arc<Self>, results: Vec<Result<(), RemoteError>>) -> Arc<Self> {
        self.inner.lock().unwrap().script.extend(results);
        Arc::clone(self)
    }

    /// Let `n` gated calls finish.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_ids(&self) -> Vec<Vec<u64>> {
        self.calls()
            .into_iter()
            .map(|call| call.ids.iter().map(MessageId::get).collect())
            .collect()
    }

    pub fn presence_calls(&self) -> u32 {
        self.inner.lock().unwrap().presence_calls
    }
}

pub fn failure() -> Result<(), RemoteError> {
    Err(RemoteError::Network("connection reset".to_string()))
}

pub fn session() -> Session {
    Session::new("https://chat.example.com", "reader@example.com", "test-key")
}

pub fn ids(raw: &[u64]) -> Vec<MessageId> {
    raw.iter()
        .map(|n| MessageId::new(*n).expect("valid id"))
        .collect()
}

#[async_trait]
impl ReadReceiptService for RecordingService {
    async fn queue_mark_as_read(
        &self,
        _session: &Session,
        ids: &[MessageId],
    ) -> Result<(), RemoteError> {
        self.inner.lock().unwrap().calls.push(RecordedCall {
            ids: ids.to_vec(),
            at: Instant::now(),
        });
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        self.inner
            .lock()
            .unwrap()
            .script
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl PresenceService for RecordingService {
    async fn register_activity(&self, _session: &Session) -> Result<(), RemoteError> {
        self.inner.lock().unwrap().presence_calls += 1;
        Ok(())
    }
}
