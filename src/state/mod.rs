//! Per-conversation state.
//!
//! `unread` is pure; `activity` and `conversation` spawn background work on
//! the tokio runtime they are created in.

pub mod activity;
pub mod conversation;
pub mod unread;

// Re-export for convenience
pub use activity::{ActivityRegistrar, ActivityThrottle};
pub use conversation::{ConversationView, RenderInputs, RenderSummary, ScrollOutcome, ViewSettings};
pub use unread::{ReadFlagMap, UnreadSetEngine};
