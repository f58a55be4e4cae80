//! One open conversation view: the scroll → unread → mark → sync pipeline.
//!
//! Owns an independent instance of every per-conversation component. Nothing
//! here is shared with other views.

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

use super::activity::ActivityRegistrar;
use super::unread::{ReadFlagMap, UnreadSetEngine};
use crate::model::{FetchStatus, Generation, MessageId, Narrow, StreamCatalog};
use crate::remote::{PresenceHandle, ReadReceiptHandle, Session};
use crate::sync::{QueueSnapshot, ReadSyncQueue, SyncConfig};
use crate::view_state::compose::{ComposeAvailability, NarrowClassifier};
use crate::view_state::lifecycle::{ListInputs, ListLifecycle, RenderState};
use crate::view_state::viewport::{ScrollEvent, ViewportTracker};

/// Runtime knobs for a conversation view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    /// Debounce and retry settings for read receipts.
    pub sync: SyncConfig,
    /// Minimum time between presence registrations.
    pub activity_interval: Duration,
    /// Offset at or below which the viewport counts as "at the bottom".
    pub near_bottom_threshold: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            activity_interval: Duration::from_secs(15),
            near_bottom_threshold: 24.0,
        }
    }
}

/// What a scroll event did.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    /// Ids in the viewport.
    pub visible_ids: Vec<MessageId>,
    /// Ids that were unread and are now marked read locally. The presentation
    /// layer re-renders badges from this immediately.
    pub newly_read: BTreeSet<MessageId>,
    /// Raw distance from the bottom.
    pub unread_banner_offset: f64,
    /// Whether a presence call went out.
    pub activity_registered: bool,
}

/// Application state a render is computed from.
#[derive(Debug, Clone, Copy)]
pub struct RenderInputs<'a> {
    /// Ids of every message loaded for the narrow.
    pub message_ids: &'a [MessageId],
    /// Fetch flags for both directions.
    pub fetch: FetchStatus,
    /// No fetch has been issued for the narrow yet.
    pub needs_initial_fetch: bool,
    /// Streams the user is subscribed to.
    pub subscriptions: &'a StreamCatalog,
    /// Every stream the client knows of.
    pub streams: &'a StreamCatalog,
}

/// Render-state outputs for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    /// Loaded messages not yet marked read.
    pub unread_count: usize,
    /// Distance from the bottom, clamped at zero.
    pub unread_banner_offset: f64,
    /// The viewport is within the near-bottom threshold.
    pub near_bottom: bool,
    /// Whether the compose box is shown.
    pub compose: ComposeAvailability,
    /// Which list body to show.
    pub list: RenderState,
    /// The not-subscribed notice offers a subscribe button.
    pub subscribe_button: bool,
}

/// A conversation view and the components it owns.
#[derive(Debug)]
pub struct ConversationView {
    narrow: Narrow,
    generation: Generation,
    viewport: ViewportTracker,
    unread: UnreadSetEngine,
    sync: ReadSyncQueue,
    activity: ActivityRegistrar,
    near_bottom_threshold: f64,
}

impl ConversationView {
    /// Open a view on `narrow`. Must be called inside a tokio runtime.
    pub fn open(
        narrow: Narrow,
        session: Session,
        read_receipts: ReadReceiptHandle,
        presence: PresenceHandle,
        settings: &ViewSettings,
    ) -> Self {
        let generation = Generation::INITIAL;
        let sync = ReadSyncQueue::spawn(read_receipts, session.clone(), settings.sync, generation);
        let activity = ActivityRegistrar::new(presence, session, settings.activity_interval);
        info!(narrow = ?narrow, generation = %generation, "conversation opened");
        Self {
            narrow,
            generation,
            viewport: ViewportTracker::new(),
            unread: UnreadSetEngine::new(),
            sync,
            activity,
            near_bottom_threshold: settings.near_bottom_threshold,
        }
    }

    /// The active narrow.
    pub fn narrow(&self) -> &Narrow {
        &self.narrow
    }

    /// Generation of the active narrow.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Local read flags.
    pub fn unread(&self) -> &UnreadSetEngine {
        &self.unread
    }

    /// Last known viewport position.
    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    /// Handle a scroll event. Never waits on the network.
    pub fn on_scroll(&mut self, event: &ScrollEvent) -> ScrollOutcome {
        let snapshot = self.viewport.on_scroll(event);
        let newly_read = self
            .unread
            .unread_among(snapshot.visible_ids.iter().copied());

        if !newly_read.is_empty() {
            self.unread.mark_read(newly_read.iter().copied());
            self.sync
                .enqueue(newly_read.iter().copied(), self.generation);
            debug!(
                generation = %self.generation,
                ids = newly_read.len(),
                "marked visible messages read"
            );
        }

        // Presence is touched only for scrolls that show at least one valid id,
        // not for every scroll event.
        let activity_registered = !snapshot.visible_ids.is_empty() && self.activity.touch();

        ScrollOutcome {
            visible_ids: snapshot.visible_ids,
            newly_read,
            unread_banner_offset: snapshot.unread_banner_offset,
            activity_registered,
        }
    }

    /// Switch to another narrow. Returns the (possibly unchanged) generation.
    ///
    /// Undelivered read receipts of the old narrow are abandoned; local read
    /// flags are kept.
    pub fn set_narrow(&mut self, narrow: Narrow) -> Generation {
        if narrow == self.narrow {
            return self.generation;
        }
        let previous = self.generation;
        self.generation = previous.next();
        self.sync.switch_generation(self.generation);
        self.viewport.reset();
        info!(
            from = %previous,
            to = %self.generation,
            narrow = ?narrow,
            "narrow changed"
        );
        self.narrow = narrow;
        self.generation
    }

    /// Replace the local read flags with a full server resync.
    pub fn resync(&mut self, flags: ReadFlagMap) {
        debug!(read = flags.read_count(), "read flags resynced");
        self.unread.replace_all(flags);
    }

    /// Compute the render-state outputs.
    pub fn render(&self, inputs: &RenderInputs<'_>) -> RenderSummary {
        let subscribed = NarrowClassifier::is_subscribed(&self.narrow, inputs.subscriptions);
        let list = ListLifecycle::select(&ListInputs {
            message_count: inputs.message_ids.len(),
            fetch: inputs.fetch,
            needs_initial_fetch: inputs.needs_initial_fetch,
        })
        .with_subscription(subscribed);
        let compose = NarrowClassifier::compose_availability(&self.narrow, inputs.subscriptions);
        let offers_subscribe =
            compose == ComposeAvailability::NotSubscribed || list == RenderState::PromptToSubscribe;

        RenderSummary {
            unread_count: self.unread.count(inputs.message_ids.iter().copied()),
            unread_banner_offset: self.viewport.last_offset().max(0.0),
            near_bottom: self.viewport.is_near_bottom(self.near_bottom_threshold),
            compose,
            list,
            subscribe_button: offers_subscribe
                && !NarrowClassifier::requires_invite_to_subscribe(&self.narrow, inputs.streams),
        }
    }

    /// Sync queue bookkeeping, or `None` if its worker has stopped.
    pub async fn sync_snapshot(&self) -> Option<QueueSnapshot> {
        self.sync.snapshot().await
    }

    /// Wait until every queued read receipt is delivered.
    pub async fn wait_synced(&self) {
        self.sync.wait_idle().await;
    }

    /// Close the view. Undelivered read receipts are dropped.
    pub async fn close(self) {
        info!(generation = %self.generation, "conversation closed");
        self.sync.shutdown().await;
    }
}
