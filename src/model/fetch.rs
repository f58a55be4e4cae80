//! Conversation-loading progress, as reported by the data-fetch layer.

use serde::{Deserialize, Serialize};

/// Which directions of the message buffer are currently being fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStatus {
    /// Older messages (above the buffer) are being fetched.
    #[serde(default)]
    pub older_in_flight: bool,
    /// Newer messages (below the buffer) are being fetched.
    #[serde(default)]
    pub newer_in_flight: bool,
}

impl FetchStatus {
    /// Nothing is being fetched.
    pub const IDLE: Self = Self {
        older_in_flight: false,
        newer_in_flight: false,
    };

    /// Whether any fetch is in flight.
    pub fn any_in_flight(&self) -> bool {
        self.older_in_flight || self.newer_in_flight
    }
}
