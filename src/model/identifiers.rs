//! Core identifier newtypes with smart constructors.
//!
//! Message ids are positive integers assigned by the server. Ids arriving from
//! the rendering layer are loosely typed (numbers, numeric strings), so they are
//! coerced at the boundary via [`RawMessageId`] and never trusted past it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use thiserror::Error;

/// Server-assigned message identifier. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct MessageId(NonZeroU64);

/// Error returned when a raw value is not a valid message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message id must be a positive integer (got {0})")]
pub struct InvalidMessageId(pub u64);

impl MessageId {
    /// Smart constructor: rejects zero.
    pub fn new(raw: u64) -> Result<Self, InvalidMessageId> {
        NonZeroU64::new(raw).map(Self).ok_or(InvalidMessageId(raw))
    }

    /// Get the raw u64 value.
    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for MessageId {
    type Error = InvalidMessageId;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<MessageId> for u64 {
    fn from(id: MessageId) -> Self {
        id.get()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loosely typed message id as emitted by the rendering layer.
///
/// The list renderer reports ids as whatever it stored them as, which may be
/// JSON numbers or strings. Use [`RawMessageId::coerce`] to turn one into a
/// [`MessageId`]; anything that is not a positive integer is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMessageId {
    /// Integral JSON number that fits in `i64`.
    Integer(i64),
    /// Integral JSON number above `i64::MAX`.
    Unsigned(u64),
    /// Non-integral JSON number.
    Float(f64),
    /// String form, e.g. `"1234"`.
    Text(String),
}

impl RawMessageId {
    /// Coerce to a [`MessageId`].
    ///
    /// Accepts integral numbers and numeric strings (surrounding whitespace and
    /// an integral decimal form such as `"12.0"` are tolerated). Returns `None`
    /// for zero, negatives, fractions, NaN/infinite values and non-numeric text.
    pub fn coerce(&self) -> Option<MessageId> {
        match self {
            RawMessageId::Integer(n) => u64::try_from(*n).ok().and_then(|n| MessageId::new(n).ok()),
            RawMessageId::Unsigned(n) => MessageId::new(*n).ok(),
            RawMessageId::Float(f) => coerce_float(*f),
            RawMessageId::Text(s) => {
                let trimmed = s.trim();
                if let Ok(n) = trimmed.parse::<u64>() {
                    return MessageId::new(n).ok();
                }
                trimmed.parse::<f64>().ok().and_then(coerce_float)
            }
        }
    }
}

impl From<u64> for RawMessageId {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => RawMessageId::Integer(n),
            Err(_) => RawMessageId::Unsigned(n),
        }
    }
}

fn coerce_float(f: f64) -> Option<MessageId> {
    if !f.is_finite() || f.fract() != 0.0 || f < 1.0 || f > u64::MAX as f64 {
        return None;
    }
    MessageId::new(f as u64).ok()
}

/// Coerce a sequence of raw ids, dropping malformed entries.
pub fn coerce_ids<'a>(raw: impl IntoIterator<Item = &'a RawMessageId>) -> Vec<MessageId> {
    raw.into_iter().filter_map(RawMessageId::coerce).collect()
}

/// Epoch of the active narrow.
///
/// Bumped every time the conversation view switches narrow. Background work is
/// tagged with the generation it was created under and discarded once stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Generation of a freshly opened conversation view.
    pub const INITIAL: Self = Self(0);

    /// Create a generation from a raw counter value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw counter value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The generation that follows this one. Saturates at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> MessageId {
        MessageId::new(n).expect("valid id")
    }

    #[test]
    fn message_id_rejects_zero() {
        assert_eq!(MessageId::new(0), Err(InvalidMessageId(0)));
    }

    #[test]
    fn message_id_accepts_positive() {
        assert_eq!(id(42).get(), 42);
        assert_eq!(id(42).to_string(), "42");
    }

    #[test]
    fn message_id_deserializes_from_number_and_rejects_zero() {
        let parsed: MessageId = serde_json::from_str("17").unwrap();
        assert_eq!(parsed, id(17));
        assert!(serde_json::from_str::<MessageId>("0").is_err());
        assert!(serde_json::from_str::<MessageId>("-3").is_err());
    }

    mod coerce {
        use super::*;

        fn raw(json: &str) -> RawMessageId {
            serde_json::from_str(json).expect("valid raw id json")
        }

        #[test]
        fn integers_map_directly() {
            assert_eq!(raw("10").coerce(), Some(id(10)));
        }

        #[test]
        fn numeric_strings_are_parsed() {
            assert_eq!(raw("\"11\"").coerce(), Some(id(11)));
            assert_eq!(raw("\" 12 \"").coerce(), Some(id(12)));
            assert_eq!(raw("\"13.0\"").coerce(), Some(id(13)));
        }

        #[test]
        fn integral_floats_are_accepted() {
            assert_eq!(raw("14.0").coerce(), Some(id(14)));
        }

        #[test]
        fn malformed_values_are_dropped() {
            for json in ["0", "-1", "2.5", "\"abc\"", "\"\"", "\"-7\"", "\"1e400\""] {
                assert_eq!(raw(json).coerce(), None, "{json} should be dropped");
            }
        }

        #[test]
        fn coerce_ids_filters_and_preserves_order() {
            let input = vec![raw("3"), raw("\"x\""), raw("\"1\""), raw("-2")];
            assert_eq!(coerce_ids(&input), vec![id(3), id(1)]);
        }

        #[test]
        fn from_u64_round_trips_through_coerce() {
            assert_eq!(RawMessageId::from(99).coerce(), Some(id(99)));
        }

        #[test]
        fn integers_above_i64_max_keep_full_precision() {
            let above = i64::MAX as u64 + 2;
            assert_eq!(raw(&above.to_string()), RawMessageId::Unsigned(above));
            assert_eq!(raw(&above.to_string()).coerce(), Some(id(above)));
            assert_eq!(raw(&u64::MAX.to_string()).coerce(), Some(id(u64::MAX)));
            assert_eq!(RawMessageId::from(above).coerce(), Some(id(above)));
            assert_eq!(raw(&i64::MAX.to_string()), RawMessageId::Integer(i64::MAX));
        }
    }

    #[test]
    fn generation_next_increments() {
        let g = Generation::INITIAL;
        assert_eq!(g.next().get(), 1);
        assert_eq!(g.next().next(), Generation::new(2));
        assert_eq!(Generation::new(3).to_string(), "g3");
    }

    #[test]
    fn generation_next_saturates_instead_of_wrapping() {
        let last = Generation::new(u64::MAX);
        assert_eq!(last.next(), last);
        assert!(last.next() > Generation::INITIAL);
    }
}
