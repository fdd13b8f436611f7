//! Shared helpers for integration tests.
//!
//! - `log_capture`: thread-local tracing capture with assertions
//! - `fixtures`: config files and mock-server helpers

pub mod fixtures;
pub mod log_capture;
