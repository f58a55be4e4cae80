//! Authoritative local read flags.

use crate::model::MessageId;
use std::collections::{BTreeSet, HashMap};

/// Read flag per message id.
///
/// Absent ids are unread. Built either incrementally by
/// [`UnreadSetEngine::mark_read`] or wholesale from a server resync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadFlagMap(HashMap<MessageId, bool>);

impl ReadFlagMap {
    /// Empty map: everything unread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is flagged read.
    pub fn is_read(&self, id: MessageId) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    /// Number of ids flagged read.
    pub fn read_count(&self) -> usize {
        self.0.values().filter(|read| **read).count()
    }
}

impl FromIterator<MessageId> for ReadFlagMap {
    /// Build from the list of read ids a server resync delivers.
    fn from_iter<T: IntoIterator<Item = MessageId>>(iter: T) -> Self {
        Self(iter.into_iter().map(|id| (id, true)).collect())
    }
}

impl FromIterator<(MessageId, bool)> for ReadFlagMap {
    fn from_iter<T: IntoIterator<Item = (MessageId, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Owns the [`ReadFlagMap`] and answers unread questions against it.
///
/// # Invariant
/// Flags only ever go from unread to read through this type. The sole
/// downgrade path is [`UnreadSetEngine::replace_all`], used when the server
/// sends a full resync.
#[derive(Debug, Clone, Default)]
pub struct UnreadSetEngine {
    flags: ReadFlagMap,
}

impl UnreadSetEngine {
    /// Engine with nothing read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine seeded from existing flags.
    pub fn with_flags(flags: ReadFlagMap) -> Self {
        Self { flags }
    }

    /// Candidates not currently flagged read.
    pub fn unread_among<I>(&self, candidates: I) -> BTreeSet<MessageId>
    where
        I: IntoIterator<Item = MessageId>,
    {
        candidates
            .into_iter()
            .filter(|id| !self.flags.is_read(*id))
            .collect()
    }

    /// Flag every id read. Returns how many were not already read.
    ///
    /// Idempotent; an empty input is a no-op.
    pub fn mark_read<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = MessageId>,
    {
        let mut newly_read = 0;
        for id in ids {
            let flag = self.flags.0.entry(id).or_insert(false);
            if !*flag {
                *flag = true;
                newly_read += 1;
            }
        }
        newly_read
    }

    /// Number of distinct unread ids in `all_ids`.
    pub fn count<I>(&self, all_ids: I) -> usize
    where
        I: IntoIterator<Item = MessageId>,
    {
        self.unread_among(all_ids).len()
    }

    /// Whether `id` is flagged read.
    pub fn is_read(&self, id: MessageId) -> bool {
        self.flags.is_read(id)
    }

    /// Replace every flag with a server resync.
    pub fn replace_all(&mut self, flags: ReadFlagMap) {
        self.flags = flags;
    }

    /// Current flags.
    pub fn flags(&self) -> &ReadFlagMap {
        &self.flags
    }
}
