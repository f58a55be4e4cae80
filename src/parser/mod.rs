//! JSONL parser for conversation event scripts.
//!
//! Each non-blank line is one JSON object tagged by `"type"`. Lines starting
//! with `#` are comments. Parsing is pure; failures carry the line number
//! and never abort the rest of the script.

use serde::Deserialize;
use serde_json::Value;

use crate::model::{FetchStatus, Narrow, ParseError, RawMessageId, StreamCatalog};
use crate::view_state::ScrollEvent;

const EVENT_TYPE_NARROW: &str = "narrow";

/// One step of a script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Switch the view to another narrow.
    Narrow {
        /// Narrow in operator/operand form.
        narrow: Narrow,
    },
    /// The renderer reported a scroll/layout change.
    Scroll(ScrollEvent),
    /// The message buffer changed.
    Messages {
        /// Loaded message ids.
        #[serde(default)]
        ids: Vec<RawMessageId>,
        /// Fetches in flight.
        #[serde(default)]
        fetch: FetchStatus,
        /// The initial fetch has not completed.
        #[serde(default, rename = "needsInitialFetch")]
        needs_initial_fetch: bool,
    },
    /// Subscription and stream catalogs changed.
    Catalog {
        /// Streams the user is subscribed to.
        #[serde(default)]
        subscriptions: StreamCatalog,
        /// Every known stream.
        #[serde(default)]
        streams: StreamCatalog,
    },
    /// Full read-state resync from the server.
    Resync {
        /// Ids the server holds as read.
        #[serde(default)]
        read: Vec<RawMessageId>,
    },
    /// Emit the current render summary.
    Render,
    /// Let time pass.
    Sleep {
        /// Milliseconds.
        ms: u64,
    },
}

/// Parse one script line.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// [`ParseError::InvalidNarrow`] if a `narrow` event carries unsupported
/// terms, [`ParseError::InvalidJson`] for anything else that does not parse.
pub fn parse_event(line: &str, line_number: usize) -> Result<Option<ScriptEvent>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|e| ParseError::InvalidJson {
        line: line_number,
        message: e.to_string(),
    })?;
    let is_narrow = value.get("type").and_then(Value::as_str) == Some(EVENT_TYPE_NARROW);

    ScriptEvent::deserialize(value).map(Some).map_err(|e| {
        if is_narrow {
            ParseError::InvalidNarrow {
                line: line_number,
                message: e.to_string(),
            }
        } else {
            ParseError::InvalidJson {
                line: line_number,
                message: e.to_string(),
            }
        }
    })
}
