//! Shared test utilities for linkreach integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against a record store in a temp directory
//! - Builder patterns for creating records and configurations programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
