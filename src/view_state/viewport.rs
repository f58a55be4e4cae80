//! Viewport tracking: visible ids and distance from the bottom.

use crate::model::{MessageId, RawMessageId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Height of a scrollable region, in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Height in layout units.
    pub height: f64,
}

/// Scroll position of the content, in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentOffset {
    /// Distance from the top of the content to the top of the viewport.
    pub y: f64,
}

/// Raw scroll/layout measurement emitted by the list renderer.
///
/// Field names follow the renderer's camelCase event shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollEvent {
    /// Ids of the messages currently rendered in the viewport, loosely typed.
    #[serde(default)]
    pub visible_ids: Vec<RawMessageId>,
    /// Total size of the scrollable content.
    pub content_size: Extent,
    /// Current scroll offset.
    pub content_offset: ContentOffset,
    /// Size of the viewport itself.
    pub layout_measurement: Extent,
}

impl ScrollEvent {
    /// Build an event from already-typed ids.
    pub fn new(
        visible_ids: impl IntoIterator<Item = u64>,
        content_height: f64,
        offset_y: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            visible_ids: visible_ids.into_iter().map(RawMessageId::from).collect(),
            content_size: Extent {
                height: content_height,
            },
            content_offset: ContentOffset { y: offset_y },
            layout_measurement: Extent {
                height: viewport_height,
            },
        }
    }
}

/// What one scroll event resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSnapshot {
    /// Visible ids, coerced and de-duplicated (first occurrence order).
    pub visible_ids: Vec<MessageId>,
    /// Distance between the current scroll position and the true bottom.
    ///
    /// Raw value: negative when the renderer over-scrolls past the end.
    pub unread_banner_offset: f64,
}

/// Turns scroll events into visible-id sets and retains the latest offset.
///
/// Holds no buffer across calls: each event is handled in O(visible ids)
/// and independently of the previous one, so arbitrarily frequent events
/// never queue up here.
///
/// # Reset rule
/// The retained offset belongs to one narrow. The owner must call
/// [`ViewportTracker::reset`] whenever the narrow (and so the generation)
/// changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportTracker {
    last_offset: f64,
}

impl ViewportTracker {
    /// Create a tracker at offset zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a scroll event.
    pub fn on_scroll(&mut self, event: &ScrollEvent) -> ViewportSnapshot {
        let mut seen = HashSet::with_capacity(event.visible_ids.len());
        let visible_ids = event
            .visible_ids
            .iter()
            .filter_map(RawMessageId::coerce)
            .filter(|id| seen.insert(*id))
            .collect();

        let offset = event.content_size.height
            - event.content_offset.y
            - event.layout_measurement.height;
        self.last_offset = offset;

        ViewportSnapshot {
            visible_ids,
            unread_banner_offset: offset,
        }
    }

    /// Offset retained from the most recent event.
    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    /// Whether the viewport was within `threshold` of the bottom at the last
    /// event. Used to decide whether new messages should auto-scroll.
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.last_offset <= threshold
    }

    /// Forget the retained offset (narrow changed).
    pub fn reset(&mut self) {
        self.last_offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> MessageId {
        MessageId::new(n).expect("valid id")
    }

    #[test]
    fn offset_is_distance_from_bottom() {
        let mut tracker = ViewportTracker::new();
        let snapshot = tracker.on_scroll(&ScrollEvent::new([], 1000.0, 700.0, 200.0));
        assert_eq!(snapshot.unread_banner_offset, 100.0);
        assert_eq!(tracker.last_offset(), 100.0);
    }

    #[test]
    fn offset_is_not_clamped() {
        let mut tracker = ViewportTracker::new();
        let snapshot = tracker.on_scroll(&ScrollEvent::new([], 500.0, 400.0, 200.0));
        assert_eq!(snapshot.unread_banner_offset, -100.0);
    }

    #[test]
    fn visible_ids_are_deduplicated_in_first_seen_order() {
        let mut tracker = ViewportTracker::new();
        let snapshot = tracker.on_scroll(&ScrollEvent::new([12, 10, 12, 11, 10], 0.0, 0.0, 0.0));
        assert_eq!(snapshot.visible_ids, vec![id(12), id(10), id(11)]);
    }

    #[test]
    fn malformed_ids_are_filtered() {
        let event: ScrollEvent = serde_json::from_str(
            r#"{
                "visibleIds": ["10", 11, -1, "abc", 0, 12.5, "11"],
                "contentSize": {"height": 300},
                "contentOffset": {"y": 0},
                "layoutMeasurement": {"height": 300}
            }"#,
        )
        .unwrap();
        let snapshot = ViewportTracker::new().on_scroll(&event);
        assert_eq!(snapshot.visible_ids, vec![id(10), id(11)]);
        assert_eq!(snapshot.unread_banner_offset, 0.0);
    }

    #[test]
    fn missing_visible_ids_means_empty() {
        let event: ScrollEvent = serde_json::from_str(
            r#"{"contentSize":{"height":10},"contentOffset":{"y":0},"layoutMeasurement":{"height":10}}"#,
        )
        .unwrap();
        assert!(ViewportTracker::new().on_scroll(&event).visible_ids.is_empty());
    }

    #[test]
    fn each_event_replaces_the_retained_offset() {
        let mut tracker = ViewportTracker::new();
        tracker.on_scroll(&ScrollEvent::new([], 1000.0, 0.0, 200.0));
        assert_eq!(tracker.last_offset(), 800.0);
        tracker.on_scroll(&ScrollEvent::new([], 1000.0, 790.0, 200.0));
        assert_eq!(tracker.last_offset(), 10.0);
    }

    #[test]
    fn near_bottom_uses_retained_offset() {
        let mut tracker = ViewportTracker::new();
        tracker.on_scroll(&ScrollEvent::new([], 1000.0, 790.0, 200.0));
        assert!(tracker.is_near_bottom(24.0));
        tracker.on_scroll(&ScrollEvent::new([], 1000.0, 500.0, 200.0));
        assert!(!tracker.is_near_bottom(24.0));
    }

    #[test]
    fn reset_returns_offset_to_zero() {
        let mut tracker = ViewportTracker::new();
        tracker.on_scroll(&ScrollEvent::new([], 1000.0, 0.0, 200.0));
        tracker.reset();
        assert_eq!(tracker.last_offset(), 0.0);
        assert_eq!(tracker, ViewportTracker::default());
    }
}
