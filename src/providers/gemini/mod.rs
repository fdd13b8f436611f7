//! Gemini provider.
//!
//! Two interchangeable backends share the registry name `gemini`:
//! - [`cli::GeminiCliProvider`] shells out to the `gemini` binary
//! - [`api::GeminiApiProvider`] calls the Generative Language REST API
//!
//! `[gemini].backend` picks one at startup.

pub mod api;
pub mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use api::GeminiApiProvider;
pub use cli::GeminiCliProvider;

use crate::core::provider::Provider;
use crate::storage::{GeminiBackend, GeminiConfig};

pub(crate) const NAME: &str = "gemini";

/// Probe the configured backend.
pub async fn probe(config: &GeminiConfig, keys_file: &Path, timeout: Duration) -> Arc<dyn Provider> {
    match config.backend {
        GeminiBackend::Cli => Arc::new(GeminiCliProvider::probe(config, timeout).await),
        GeminiBackend::Api => Arc::new(GeminiApiProvider::probe(config, keys_file, timeout).await),
    }
}
