//! Script replay: feeds parsed events into a conversation view.
//!
//! `process_lines` is pure. `ScriptRunner` owns the view plus the application
//! state a real client would hold around it (loaded ids, fetch flags,
//! catalogs) and turns `render` events into summaries.

use std::time::Duration;
use tracing::{debug, warn};

use crate::model::{coerce_ids, FetchStatus, MessageId, ParseError, StreamCatalog};
use crate::parser::{self, ScriptEvent};
use crate::state::{ConversationView, ReadFlagMap, RenderInputs, RenderSummary};

/// Parse script lines into events.
///
/// Blank and comment lines are dropped. Returns the events with their line
/// numbers, and the parse errors separately.
pub fn process_lines(
    lines: Vec<String>,
    starting_line_number: usize,
) -> (Vec<(usize, ScriptEvent)>, Vec<ParseError>) {
    let mut events = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = starting_line_number + index;
        match parser::parse_event(&line, line_number) {
            Ok(Some(event)) => events.push((line_number, event)),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    (events, errors)
}

/// Replays script events against one conversation view.
#[derive(Debug)]
pub struct ScriptRunner {
    view: ConversationView,
    message_ids: Vec<MessageId>,
    fetch: FetchStatus,
    needs_initial_fetch: bool,
    subscriptions: StreamCatalog,
    streams: StreamCatalog,
}

impl ScriptRunner {
    /// Wrap a freshly opened view. Nothing is loaded yet.
    pub fn new(view: ConversationView) -> Self {
        Self {
            view,
            message_ids: Vec::new(),
            fetch: FetchStatus::IDLE,
            needs_initial_fetch: true,
            subscriptions: StreamCatalog::default(),
            streams: StreamCatalog::default(),
        }
    }

    /// The conversation view the script drives.
    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    /// Apply one event. Returns a summary for `render` events.
    pub async fn apply(&mut self, event: ScriptEvent) -> Option<RenderSummary> {
        match event {
            ScriptEvent::Narrow { narrow } => {
                let before = self.view.generation();
                if self.view.set_narrow(narrow) != before {
                    // A new narrow starts with an empty buffer.
                    self.message_ids.clear();
                    self.fetch = FetchStatus::IDLE;
                    self.needs_initial_fetch = true;
                }
                None
            }
            ScriptEvent::Scroll(scroll) => {
                let outcome = self.view.on_scroll(&scroll);
                debug!(
                    visible = outcome.visible_ids.len(),
                    newly_read = outcome.newly_read.len(),
                    offset = outcome.unread_banner_offset,
                    "scroll applied"
                );
                None
            }
            ScriptEvent::Messages {
                ids,
                fetch,
                needs_initial_fetch,
            } => {
                self.message_ids = coerce_ids(&ids);
                self.fetch = fetch;
                self.needs_initial_fetch = needs_initial_fetch;
                None
            }
            ScriptEvent::Catalog {
                subscriptions,
                streams,
            } => {
                self.subscriptions = subscriptions;
                self.streams = streams;
                None
            }
            ScriptEvent::Resync { read } => {
                self.view.resync(coerce_ids(&read).into_iter().collect::<ReadFlagMap>());
                None
            }
            ScriptEvent::Render => Some(self.render()),
            ScriptEvent::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                None
            }
        }
    }

    /// Current render summary.
    pub fn render(&self) -> RenderSummary {
        self.view.render(&RenderInputs {
            message_ids: &self.message_ids,
            fetch: self.fetch,
            needs_initial_fetch: self.needs_initial_fetch,
            subscriptions: &self.subscriptions,
            streams: &self.streams,
        })
    }

    /// Apply events in order, collecting render summaries.
    pub async fn run(&mut self, events: Vec<(usize, ScriptEvent)>) -> Vec<RenderSummary> {
        let mut summaries = Vec::new();
        for (line, event) in events {
            debug!(line, "applying script event");
            if let Some(summary) = self.apply(event).await {
                summaries.push(summary);
            }
        }
        summaries
    }

    /// Wait up to `timeout` for pending read receipts, then close the view.
    ///
    /// Returns whether everything was delivered in time.
    pub async fn finish(self, timeout: Duration) -> bool {
        let drained = tokio::time::timeout(timeout, self.view.wait_synced())
            .await
            .is_ok();
        if !drained {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "read receipts still undelivered at exit"
            );
        }
        self.view.close().await;
        drained
    }
}
