//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod fetch;
pub mod identifiers;
pub mod narrow;

// Re-export for convenience
pub use error::{AppError, InputError, ParseError};
pub use fetch::FetchStatus;
pub use identifiers::{coerce_ids, Generation, InvalidMessageId, MessageId, RawMessageId};
pub use narrow::{Narrow, NarrowError, NarrowTerm, StreamCatalog, StreamEntry};
