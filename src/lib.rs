//! readsync
//!
//! Viewport-driven unread tracking for chat conversation views, with
//! deduplicated, retried read-receipt sync.
//!
//! The data flow for one open conversation:
//!
//! scroll event → [`view_state::ViewportTracker`] → visible ids →
//! [`state::UnreadSetEngine`] → unread subset → optimistic local mark →
//! [`sync::ReadSyncQueue`] → debounced, retried delivery to the server.
//!
//! Pure decisions (what to render, what is unread) live in `view_state` and
//! `state::unread`. Everything that waits on time or the network lives in
//! `sync` and `state::activity`.

pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod remote;
pub mod source;
pub mod state;
pub mod sync;
pub mod view_state;

// Script replay used by the binary
pub mod integration;

#[cfg(test)]
mod test_harness;

#[cfg(test)]
mod tests;
