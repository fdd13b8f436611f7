//! ultima - unified text generation
//!
//! One façade over a local inference server (Ollama), a script-driven
//! automation project (Dolphin), and hosted model APIs (Claude, OpenAI,
//! Gemini), with an ordered fallback chain across them.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod providers;
pub mod render;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::core::facade::Ultima;
pub use error::{ExitCode, Result, UltimaError};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
