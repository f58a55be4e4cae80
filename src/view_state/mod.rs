//! View-state layer: pure decisions about what to render.
//!
//! # Module Structure
//!
//! - `compose`: NarrowClassifier - compose availability and subscription checks
//! - `lifecycle`: ListLifecycle - loading / empty / active selection
//! - `viewport`: ViewportTracker - visible ids and distance from the bottom

pub mod compose;
pub mod lifecycle;
pub mod viewport;

pub use compose::{ComposeAvailability, NarrowClassifier};
pub use lifecycle::{ListInputs, ListLifecycle, ListState, RenderState};
pub use viewport::{ScrollEvent, ViewportSnapshot, ViewportTracker};
