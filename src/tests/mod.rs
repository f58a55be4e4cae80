//! Internal test modules - whitebox tests with crate access
//!
//! Scenario tests that drive a whole conversation view against the
//! recording test double, plus snapshots of rendered output.
