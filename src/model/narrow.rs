//! Narrow descriptors and stream catalogs.
//!
//! A narrow selects which slice of the conversation space is in view. On the
//! wire it is a list of operator/operand terms; internally it is a closed sum
//! type so every consumer matches exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which subset of the conversation space is currently in view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<NarrowTerm>", into = "Vec<NarrowTerm>")]
pub enum Narrow {
    /// Every message the user can see.
    All,
    /// One stream.
    Stream {
        /// Stream name.
        stream: String,
    },
    /// One topic within a stream.
    Topic {
        /// Stream name.
        stream: String,
        /// Topic name.
        topic: String,
    },
    /// A private exchange with one or more participants (never empty).
    PrivateMessage {
        /// Participant emails, excluding the current user.
        participants: Vec<String>,
    },
    /// Every private conversation at once.
    AllPrivate,
    /// Messages the user starred.
    Starred,
    /// Messages mentioning the user.
    Mentioned,
    /// Full-text search results.
    Search {
        /// Search query.
        query: String,
    },
}

impl Narrow {
    /// Create a stream narrow.
    pub fn stream(stream: impl Into<String>) -> Self {
        Self::Stream {
            stream: stream.into(),
        }
    }

    /// Create a topic narrow.
    pub fn topic(stream: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::Topic {
            stream: stream.into(),
            topic: topic.into(),
        }
    }

    /// Create a private-message narrow.
    ///
    /// # Errors
    ///
    /// Returns [`NarrowError::NoParticipants`] if `participants` is empty.
    pub fn private<I, S>(participants: I) -> Result<Self, NarrowError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let participants: Vec<String> = participants.into_iter().map(Into::into).collect();
        if participants.is_empty() {
            return Err(NarrowError::NoParticipants);
        }
        Ok(Self::PrivateMessage { participants })
    }

    /// The stream operand for stream and topic narrows.
    pub fn stream_name(&self) -> Option<&str> {
        match self {
            Narrow::Stream { stream } | Narrow::Topic { stream, .. } => Some(stream),
            Narrow::All
            | Narrow::PrivateMessage { .. }
            | Narrow::AllPrivate
            | Narrow::Starred
            | Narrow::Mentioned
            | Narrow::Search { .. } => None,
        }
    }
}

/// Errors converting wire terms into a [`Narrow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrowError {
    /// A private-message narrow named nobody.
    #[error("private-message narrow needs at least one participant")]
    NoParticipants,

    /// The term combination does not describe a supported narrow.
    #[error("unsupported narrow: {0}")]
    Unsupported(String),
}

/// One operator/operand pair of the wire narrow form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrowTerm {
    /// Operator, e.g. `stream`, `topic`, `pm-with`, `is`, `search`.
    pub operator: String,
    /// Operand for the operator.
    pub operand: String,
}

impl NarrowTerm {
    /// Create a term.
    pub fn new(operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            operand: operand.into(),
        }
    }
}

impl TryFrom<Vec<NarrowTerm>> for Narrow {
    type Error = NarrowError;

    fn try_from(terms: Vec<NarrowTerm>) -> Result<Self, Self::Error> {
        let pairs: Vec<(&str, &str)> = terms
            .iter()
            .map(|t| (t.operator.as_str(), t.operand.as_str()))
            .collect();

        match pairs.as_slice() {
            [] => Ok(Narrow::All),
            [("stream", stream)] => Ok(Narrow::stream(*stream)),
            [("stream", stream), ("topic", topic)] => Ok(Narrow::topic(*stream, *topic)),
            [("pm-with", emails)] => Narrow::private(
                emails
                    .split(',')
                    .map(str::trim)
                    .filter(|email| !email.is_empty()),
            ),
            [("is", "private")] => Ok(Narrow::AllPrivate),
            [("is", "starred")] => Ok(Narrow::Starred),
            [("is", "mentioned")] => Ok(Narrow::Mentioned),
            [("search", query)] => Ok(Narrow::Search {
                query: (*query).to_string(),
            }),
            other => Err(NarrowError::Unsupported(
                other
                    .iter()
                    .map(|(op, operand)| format!("{op}:{operand}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            )),
        }
    }
}

impl From<Narrow> for Vec<NarrowTerm> {
    fn from(narrow: Narrow) -> Self {
        match narrow {
            Narrow::All => Vec::new(),
            Narrow::Stream { stream } => vec![NarrowTerm::new("stream", stream)],
            Narrow::Topic { stream, topic } => vec![
                NarrowTerm::new("stream", stream),
                NarrowTerm::new("topic", topic),
            ],
            Narrow::PrivateMessage { participants } => {
                vec![NarrowTerm::new("pm-with", participants.join(","))]
            }
            Narrow::AllPrivate => vec![NarrowTerm::new("is", "private")],
            Narrow::Starred => vec![NarrowTerm::new("is", "starred")],
            Narrow::Mentioned => vec![NarrowTerm::new("is", "mentioned")],
            Narrow::Search { query } => vec![NarrowTerm::new("search", query)],
        }
    }
}

/// A stream as known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Stream name.
    pub name: String,
    /// Whether joining requires an invitation.
    #[serde(default)]
    pub invite_only: bool,
}

impl StreamEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, invite_only: bool) -> Self {
        Self {
            name: name.into(),
            invite_only,
        }
    }
}

/// A set of streams keyed by name.
///
/// Used both for the subscription catalog (streams the user is subscribed
/// to) and for the stream catalog (every stream the client knows about).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamCatalog {
    streams: Vec<StreamEntry>,
}

impl StreamCatalog {
    /// Create a catalog from entries.
    pub fn new(streams: Vec<StreamEntry>) -> Self {
        Self { streams }
    }

    /// Find a stream by exact name.
    pub fn find(&self, name: &str) -> Option<&StreamEntry> {
        self.streams.iter().find(|entry| entry.name == name)
    }

    /// Whether a stream with this exact name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl FromIterator<StreamEntry> for StreamCatalog {
    fn from_iter<T: IntoIterator<Item = StreamEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
