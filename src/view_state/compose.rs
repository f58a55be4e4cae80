//! Narrow classification: can the user compose here, and are they subscribed?

use crate::model::{Narrow, StreamCatalog};
use serde::Serialize;

/// What the compose area should show for a narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeAvailability {
    /// Show the compose box.
    Composable,
    /// Composing is allowed but the user is not subscribed: show the
    /// not-subscribed notice instead of the compose box.
    NotSubscribed,
    /// Composing makes no sense for this narrow; show nothing.
    Hidden,
}

/// Pure predicates over a narrow and the stream catalogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrowClassifier;

impl NarrowClassifier {
    /// Whether a message can be composed into this narrow.
    ///
    /// Only narrows that name a single destination are composable. Narrows
    /// spanning several unrelated conversations are not.
    pub fn can_compose(narrow: &Narrow) -> bool {
        match narrow {
            Narrow::Stream { .. } | Narrow::Topic { .. } | Narrow::PrivateMessage { .. } => true,
            Narrow::All
            | Narrow::AllPrivate
            | Narrow::Starred
            | Narrow::Mentioned
            | Narrow::Search { .. } => false,
        }
    }

    /// Whether the user is subscribed to the narrow's stream.
    ///
    /// Narrows without a stream have no subscription concept and count as
    /// subscribed. A stream missing from the catalog is simply not subscribed.
    pub fn is_subscribed(narrow: &Narrow, subscriptions: &StreamCatalog) -> bool {
        match narrow.stream_name() {
            Some(stream) => subscriptions.contains(stream),
            None => true,
        }
    }

    /// Whether joining the narrow's stream requires an invitation.
    ///
    /// Fails open: if the stream is not in the catalog (or the narrow has no
    /// stream) this returns `false`, so the subscribe option stays visible.
    pub fn requires_invite_to_subscribe(narrow: &Narrow, streams: &StreamCatalog) -> bool {
        narrow
            .stream_name()
            .and_then(|stream| streams.find(stream))
            .is_some_and(|entry| entry.invite_only)
    }

    /// Combine [`Self::can_compose`] and [`Self::is_subscribed`].
    pub fn compose_availability(
        narrow: &Narrow,
        subscriptions: &StreamCatalog,
    ) -> ComposeAvailability {
        if !Self::can_compose(narrow) {
            ComposeAvailability::Hidden
        } else if !Self::is_subscribed(narrow, subscriptions) {
            ComposeAvailability::NotSubscribed
        } else {
            ComposeAvailability::Composable
        }
    }
}
