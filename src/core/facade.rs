//! The `Ultima` façade: provider selection and the auto-mode fallback chain.
//!
//! A named selection delegates to exactly one provider. Auto mode walks the
//! priority list in order, one provider at a time, skipping providers that
//! are not registered or failed their probe, and stops at the first
//! non-empty result.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use super::models::{ChatMessage, GenerationOptions, GenerationRequest, StatusReport};
use super::provider::{Provider, ProviderRegistry, ProviderSelection, non_empty};
use crate::error::{Result, UltimaError};
use crate::providers::{ClaudeProvider, DolphinProvider, OllamaProvider, OpenAIProvider, gemini};
use crate::storage::Config;

/// System name reported in status output.
pub const SYSTEM_NAME: &str = "ULTIMA_SYSTEM";

// =============================================================================
// Dispatch Outcome
// =============================================================================

/// Record of one provider invocation.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchAttempt {
    pub provider: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a façade call with the attempts that led to it.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Provider that produced the text, if any.
    pub provider: Option<String>,
    pub result: Result<String>,
    pub attempts: Vec<DispatchAttempt>,
}

impl DispatchOutcome {
    #[must_use]
    pub fn success(provider: &str, text: String, attempts: Vec<DispatchAttempt>) -> Self {
        Self {
            provider: Some(provider.to_string()),
            result: Ok(text),
            attempts,
        }
    }

    #[must_use]
    pub const fn failure(error: UltimaError, attempts: Vec<DispatchAttempt>) -> Self {
        Self {
            provider: None,
            result: Err(error),
            attempts,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Collapse to the optional text exposed at the public boundary.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        self.result.ok()
    }
}

/// The operation being dispatched.
#[derive(Debug, Clone, Copy)]
enum Call<'a> {
    Generate(&'a GenerationRequest),
    Chat(&'a [ChatMessage], &'a GenerationOptions),
}

impl Call<'_> {
    const fn operation(&self) -> &'static str {
        match self {
            Self::Generate(_) => "generate",
            Self::Chat(..) => "chat",
        }
    }

    async fn invoke(self, provider: &dyn Provider) -> Result<String> {
        let result = match self {
            Self::Generate(request) => provider.try_generate(request).await,
            Self::Chat(history, options) => provider.try_chat(history, options).await,
        };
        result.and_then(|text| non_empty(provider.name(), text))
    }
}

// =============================================================================
// Façade
// =============================================================================

/// Single entry point over every configured backend.
#[derive(Debug, Clone)]
pub struct Ultima {
    registry: ProviderRegistry,
    priority: Vec<String>,
}

impl Ultima {
    /// Build from already-constructed adapters.
    #[must_use]
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn Provider>>, priority: Vec<String>) -> Self {
        Self {
            registry: providers.into_iter().collect(),
            priority: priority.into_iter().map(|p| p.trim().to_lowercase()).collect(),
        }
    }

    /// Probe every backend described by `config`.
    ///
    /// Never fails: a backend whose probe fails is registered as
    /// unavailable.
    pub async fn from_config(config: &Config) -> Self {
        let timeout = config.general.timeout();
        let keys_file = config.general.keys_file();

        let (ollama, dolphin, gemini, claude, openai) = tokio::join!(
            OllamaProvider::probe(&config.ollama, timeout),
            DolphinProvider::probe(&config.dolphin, timeout),
            gemini::probe(&config.gemini, &keys_file, timeout),
            ClaudeProvider::probe(&config.claude, &keys_file, timeout),
            OpenAIProvider::probe(&config.openai, &keys_file, timeout),
        );

        let providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(ollama),
            Arc::new(dolphin),
            gemini,
            Arc::new(claude),
            Arc::new(openai),
        ];
        let ultima = Self::new(providers, config.general.priority.clone());
        tracing::debug!(
            providers = ?ultima.registry.names(),
            priority = ?ultima.priority,
            "Façade ready"
        );
        ultima
    }

    #[must_use]
    pub const fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Auto-mode order.
    #[must_use]
    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// Look up one adapter by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.registry.get(name)
    }

    /// Generate text, or `None` when no provider produced any.
    pub async fn generate(
        &self,
        prompt: &str,
        selection: &ProviderSelection,
        options: &GenerationOptions,
    ) -> Option<String> {
        self.try_generate(prompt, selection, options)
            .await
            .into_text()
    }

    /// Multi-turn chat, or `None` when no provider produced any text.
    pub async fn chat(
        &self,
        history: &[ChatMessage],
        selection: &ProviderSelection,
        options: &GenerationOptions,
    ) -> Option<String> {
        self.try_chat(history, selection, options).await.into_text()
    }

    /// [`Ultima::generate`] with the full dispatch record.
    pub async fn try_generate(
        &self,
        prompt: &str,
        selection: &ProviderSelection,
        options: &GenerationOptions,
    ) -> DispatchOutcome {
        let request = GenerationRequest::new(prompt).with_options(options.clone());
        self.dispatch(Call::Generate(&request), selection).await
    }

    /// [`Ultima::chat`] with the full dispatch record.
    pub async fn try_chat(
        &self,
        history: &[ChatMessage],
        selection: &ProviderSelection,
        options: &GenerationOptions,
    ) -> DispatchOutcome {
        self.dispatch(Call::Chat(history, options), selection).await
    }

    async fn dispatch(&self, call: Call<'_>, selection: &ProviderSelection) -> DispatchOutcome {
        match selection {
            ProviderSelection::Named(name) => self.dispatch_named(call, name).await,
            ProviderSelection::Auto => self.dispatch_auto(call).await,
        }
    }

    async fn dispatch_named(&self, call: Call<'_>, name: &str) -> DispatchOutcome {
        let Some(provider) = self.registry.get(name) else {
            tracing::error!(provider = name, "Unknown provider: {name}");
            return DispatchOutcome::failure(UltimaError::UnknownProvider(name.to_string()), Vec::new());
        };

        if !provider.is_available() {
            tracing::error!(provider = name, "No available provider for: {name}");
            return DispatchOutcome::failure(
                UltimaError::ProviderUnavailable {
                    provider: provider.name().to_string(),
                    reason: "capability probe failed".to_string(),
                },
                Vec::new(),
            );
        }

        let (attempt, result) = attempt(call, provider.as_ref()).await;
        match result {
            Ok(text) => DispatchOutcome::success(provider.name(), text, vec![attempt]),
            Err(e) => DispatchOutcome::failure(e, vec![attempt]),
        }
    }

    async fn dispatch_auto(&self, call: Call<'_>) -> DispatchOutcome {
        let mut attempts = Vec::new();

        for name in &self.priority {
            let Some(provider) = self.registry.get(name) else {
                tracing::debug!(provider = %name, "Not registered, skipping");
                continue;
            };
            if !provider.is_available() {
                tracing::debug!(provider = %name, "Unavailable, skipping");
                continue;
            }

            let (record, result) = attempt(call, provider.as_ref()).await;
            attempts.push(record);
            if let Ok(text) = result {
                return DispatchOutcome::success(provider.name(), text, attempts);
            }
        }

        tracing::error!(
            operation = call.operation(),
            attempted = attempts.len(),
            "no provider available"
        );
        DispatchOutcome::failure(
            UltimaError::NoProviderAvailable {
                attempted: attempts.len(),
                listed: self.priority.len(),
            },
            attempts,
        )
    }

    /// Fresh snapshot of every registered provider.
    pub async fn status_report(&self) -> StatusReport {
        let statuses = join_all(self.registry.iter().map(|p| p.status())).await;
        StatusReport {
            system: SYSTEM_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            priority: self.priority.clone(),
            providers: self
                .registry
                .names()
                .into_iter()
                .map(str::to_string)
                .zip(statuses)
                .collect(),
        }
    }
}

/// Invoke one provider and record how it went.
async fn attempt(call: Call<'_>, provider: &dyn Provider) -> (DispatchAttempt, Result<String>) {
    let started_at = Utc::now();
    let start = Instant::now();
    tracing::info!(provider = provider.name(), operation = call.operation(), "Trying provider");

    let result = call.invoke(provider).await;
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(_) => tracing::info!(provider = provider.name(), duration_ms, "Provider succeeded"),
        Err(e) => tracing::warn!(
            provider = provider.name(),
            operation = call.operation(),
            error_code = e.error_code(),
            duration_ms,
            "{e}"
        ),
    }

    let record = DispatchAttempt {
        provider: provider.name().to_string(),
        started_at,
        duration_ms,
        success: result.is_ok(),
        error: result.as_ref().err().map(ToString::to_string),
    };
    (record, result)
}
