//! Core data models, the provider interface, and the façade.

pub mod cli_runner;
pub mod credentials;
pub mod facade;
pub mod http;
pub mod logging;
pub mod models;
pub mod probe;
pub mod provider;
pub mod secrets;

pub use credentials::OAuthCredentials;
pub use facade::{DispatchAttempt, DispatchOutcome, Ultima};
pub use models::{
    ChatMessage, ChatRole, GenerationOptions, GenerationRequest, ProviderStatus, StatusReport,
};
pub use probe::Probe;
pub use provider::{Provider, ProviderKind, ProviderRegistry, ProviderSelection};
