//! Message-list lifecycle: which of loading / empty / list to render.
//!
//! Re-evaluated from scratch on every render; nothing is persisted between
//! evaluations, so there is no transition table, only a priority order.

use crate::model::FetchStatus;
use serde::Serialize;

/// Inputs the list lifecycle is decided from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListInputs {
    /// Number of messages loaded in the conversation buffer.
    pub message_count: usize,
    /// Fetches currently in flight.
    pub fetch: FetchStatus,
    /// The initial fetch for this narrow has not completed yet.
    pub needs_initial_fetch: bool,
}

/// State of the message list itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListState {
    /// Waiting on the network.
    Loading,
    /// Nothing to show and nothing coming.
    Empty,
    /// Messages are available.
    Active,
}

/// What the surrounding UI should render in place of the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Loading placeholder.
    Loading,
    /// "No messages" placeholder.
    Empty,
    /// Empty narrow the user is not subscribed to: offer to subscribe.
    PromptToSubscribe,
    /// The message list.
    Active,
}

/// Pure selector for [`ListState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListLifecycle;

impl ListLifecycle {
    /// Pick the list state. First matching rule wins:
    ///
    /// 1. initial fetch pending → Loading (whatever the count)
    /// 2. no messages, no fetch in flight → Empty
    /// 3. no messages, a fetch in flight → Loading
    /// 4. otherwise → Active
    pub fn select(inputs: &ListInputs) -> ListState {
        if inputs.needs_initial_fetch {
            return ListState::Loading;
        }
        match (inputs.message_count, inputs.fetch.any_in_flight()) {
            (0, false) => ListState::Empty,
            (0, true) => ListState::Loading,
            _ => ListState::Active,
        }
    }
}

impl ListState {
    /// Combine with the subscription verdict from the narrow classifier.
    ///
    /// Only `Empty` is affected: an empty narrow the user is not subscribed to
    /// becomes a prompt to subscribe.
    pub fn with_subscription(self, subscribed: bool) -> RenderState {
        match self {
            ListState::Loading => RenderState::Loading,
            ListState::Empty if subscribed => RenderState::Empty,
            ListState::Empty => RenderState::PromptToSubscribe,
            ListState::Active => RenderState::Active,
        }
    }
}
