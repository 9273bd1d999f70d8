pub mod config;
pub mod diagnostics;
pub mod migrations;
pub mod selection;
pub mod store;
pub mod types;

/// Makes an in-memory store available to integration tests.
#[cfg(feature = "test-utilities")]
pub mod testing;
