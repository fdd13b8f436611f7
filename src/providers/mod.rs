//! Backend adapters.
//!
//! Each provider has its own submodule implementing [`Provider`] plus any
//! backend-specific operations.

pub mod claude;
pub mod dolphin;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use crate::core::provider::Provider;
pub use claude::{ClaudeAuth, ClaudeProvider};
pub use dolphin::{DolphinProvider, ProjectInfo};
pub use gemini::{GeminiApiProvider, GeminiCliProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
