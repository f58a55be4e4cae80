//! Outbound calls to the chat server.
//!
//! The core only needs two calls, both fire-and-forget from the caller's
//! point of view: mark a set of messages read, and register presence. They
//! are traits so conversation views can be wired to a real client, the
//! in-process [`SimulatedServer`], or a test double.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::MessageId;

pub mod simulated;

pub use simulated::{DeliveryOutcome, DeliveryRecord, SimulatedServer};

/// Authenticated session handle used for every outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Server base URL.
    pub realm: String,
    /// Account email.
    pub email: String,
    /// API key. Never printed.
    pub api_key: String,
}

impl Session {
    /// Create a session handle.
    pub fn new(
        realm: impl Into<String>,
        email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            email: email.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("realm", &self.realm)
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Failure of one outbound call.
///
/// Always handled where it occurs (retried or dropped); never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request did not complete (connection, DNS, timeout...).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP-like status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
}

/// Server endpoint that records messages as read.
///
/// Implementations must be idempotent: the sync queue delivers at least once,
/// so the same ids may arrive more than once.
#[async_trait]
pub trait ReadReceiptService: Send + Sync {
    /// Mark `ids` (never empty) as read for the session's user.
    async fn queue_mark_as_read(&self, session: &Session, ids: &[MessageId])
        -> Result<(), RemoteError>;
}

/// Server endpoint that records that the user is active.
#[async_trait]
pub trait PresenceService: Send + Sync {
    /// Register activity for the session's user.
    async fn register_activity(&self, session: &Session) -> Result<(), RemoteError>;
}

/// Shared handle to a read-receipt service.
pub type ReadReceiptHandle = Arc<dyn ReadReceiptService>;

/// Shared handle to a presence service.
pub type PresenceHandle = Arc<dyn PresenceService>;
