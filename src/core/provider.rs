//! Provider kinds, the adapter capability interface, and the registry.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::{ChatMessage, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::error::{Result, UltimaError};

// =============================================================================
// Provider Kind
// =============================================================================

/// Backends ultima knows how to build from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    Dolphin,
    Gemini,
    Claude,
    #[serde(rename = "openai")]
    OpenAI,
}

impl ProviderKind {
    /// All providers in display order.
    pub const ALL: &'static [Self] = &[
        Self::Ollama,
        Self::Dolphin,
        Self::Gemini,
        Self::Claude,
        Self::OpenAI,
    ];

    /// Default auto-mode order.
    pub const DEFAULT_PRIORITY: &'static [Self] =
        &[Self::Claude, Self::OpenAI, Self::Gemini, Self::Ollama];

    /// CLI name for this provider.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Dolphin => "dolphin",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::OpenAI => "openai",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Ollama => "Ollama",
            Self::Dolphin => "Dolphin",
            Self::Gemini => "Gemini",
            Self::Claude => "Claude AI",
            Self::OpenAI => "OpenAI",
        }
    }

    /// Parse from CLI argument.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProvider` for names outside [`Self::ALL`].
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.cli_name() == lower)
            .copied()
            .ok_or_else(|| UltimaError::UnknownProvider(name.to_string()))
    }

    /// Get installation suggestion for this provider's backend.
    #[must_use]
    pub const fn install_suggestion(self) -> &'static str {
        match self {
            Self::Ollama => "Install Ollama from https://ollama.com and run: ollama pull llama2",
            Self::Dolphin => "Set [dolphin].path in the config to the Dolphin project root",
            Self::Gemini => "Install with: npm install -g @google/gemini-cli",
            Self::Claude => "Install with: npm install -g @anthropic-ai/claude-code",
            Self::OpenAI => "Create an API key at https://platform.openai.com/api-keys",
        }
    }

    /// Get authentication suggestion for this provider.
    #[must_use]
    pub const fn auth_suggestion(self) -> &'static str {
        match self {
            Self::Ollama | Self::Dolphin => "No authentication required",
            Self::Gemini => "Set GEMINI_API_KEY or add it to the keys file",
            Self::Claude => "Set ANTHROPIC_API_KEY or run: claude auth login",
            Self::OpenAI => "Set OPENAI_API_KEY or add it to the keys file",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cli_name())
    }
}

// =============================================================================
// Capability Interface
// =============================================================================

/// Uniform contract every backend adapter implements.
///
/// Adapters keep no per-call mutable state, so one instance can serve
/// concurrent calls. The `try_*` methods return the discriminated result;
/// [`Provider::generate`] and [`Provider::chat`] collapse it to an optional
/// text after logging.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name (e.g. `ollama`).
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Result of the one-time capability probe.
    fn is_available(&self) -> bool;

    fn default_model(&self) -> Option<&str> {
        None
    }

    /// Run a single-prompt generation against the backend.
    async fn try_generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Run a multi-turn exchange against the backend.
    async fn try_chat(
        &self,
        _history: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String> {
        Err(UltimaError::Unsupported {
            provider: self.name().to_string(),
            operation: "chat",
        })
    }

    /// Fresh status snapshot. May query the backend.
    async fn status(&self) -> ProviderStatus;

    /// Generate text, or `None` on any failure or empty output.
    ///
    /// Never touches the backend when the provider is unavailable.
    async fn generate(&self, request: &GenerationRequest) -> Option<String> {
        if !self.is_available() {
            tracing::debug!(provider = self.name(), "Skipping generate: provider unavailable");
            return None;
        }
        settle(self.name(), "generate", self.try_generate(request).await)
    }

    /// Chat, or `None` on any failure or empty output.
    async fn chat(&self, history: &[ChatMessage], options: &GenerationOptions) -> Option<String> {
        if !self.is_available() {
            tracing::debug!(provider = self.name(), "Skipping chat: provider unavailable");
            return None;
        }
        settle(self.name(), "chat", self.try_chat(history, options).await)
    }
}

/// Treat blank output as a failure so callers only ever see real text.
pub(crate) fn non_empty(provider: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(UltimaError::EmptyResponse(provider.to_string()))
    } else {
        Ok(text)
    }
}

/// Collapse an adapter result at the boundary, logging the failure reason.
fn settle(provider: &str, operation: &str, result: Result<String>) -> Option<String> {
    match result.and_then(|text| non_empty(provider, text)) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(
                provider,
                operation,
                error_code = e.error_code(),
                "{e}"
            );
            None
        }
    }
}

// =============================================================================
// Provider Selection
// =============================================================================

/// Which provider a façade call should use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderSelection {
    /// Try the priority list in order.
    #[default]
    Auto,
    /// One named provider, no fallback.
    Named(String),
}

impl ProviderSelection {
    /// Parse from CLI argument string. Unknown names are kept and rejected
    /// at dispatch time.
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        let lower = arg.trim().to_lowercase();
        if lower.is_empty() || lower == "auto" {
            Self::Auto
        } else {
            Self::Named(lower)
        }
    }

    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl From<&str> for ProviderSelection {
    fn from(value: &str) -> Self {
        Self::from_arg(value)
    }
}

impl std::fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Provider Registry
// =============================================================================

/// Adapters by name, in registration order.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. A later adapter with the same name replaces the
    /// earlier one in place.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        if let Some(slot) = self
            .providers
            .iter_mut()
            .find(|p| p.name().eq_ignore_ascii_case(provider.name()))
        {
            *slot = provider;
        } else {
            self.providers.push(provider);
        }
    }

    /// Look up an adapter by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        let name = name.trim();
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl FromIterator<Arc<dyn Provider>> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Provider>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for provider in iter {
            registry.register(provider);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubProvider;

    #[test]
    fn provider_from_cli_name() {
        assert_eq!(ProviderKind::from_cli_name("ollama").unwrap(), ProviderKind::Ollama);
        assert_eq!(ProviderKind::from_cli_name("OpenAI").unwrap(), ProviderKind::OpenAI);
        assert!(matches!(
            ProviderKind::from_cli_name("invalid"),
            Err(UltimaError::UnknownProvider(_))
        ));
    }

    #[test]
    fn default_priority_is_stable() {
        let names: Vec<_> = ProviderKind::DEFAULT_PRIORITY
            .iter()
            .map(|k| k.cli_name())
            .collect();
        assert_eq!(names, ["claude", "openai", "gemini", "ollama"]);
    }

    #[test]
    fn provider_selection_from_arg() {
        assert_eq!(ProviderSelection::from_arg("auto"), ProviderSelection::Auto);
        assert_eq!(ProviderSelection::from_arg(" AUTO "), ProviderSelection::Auto);
        assert_eq!(
            ProviderSelection::from_arg("Gemini"),
            ProviderSelection::Named("gemini".to_string())
        );
        assert_eq!(ProviderSelection::from_arg("gemini").to_string(), "gemini");
    }

    #[test]
    fn registry_lookup_is_case_insensitive_and_ordered() {
        let registry: ProviderRegistry = [
            StubProvider::new("gemini").into_arc(),
            StubProvider::new("ollama").into_arc(),
        ]
        .into_iter()
        .collect();

        assert!(registry.get("OLLAMA").is_some());
        assert!(registry.get("claude").is_none());
        assert_eq!(registry.names(), ["gemini", "ollama"]);
    }

    #[test]
    fn registry_replaces_same_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(StubProvider::new("ollama").into_arc());
        registry.register(StubProvider::new("ollama").unavailable().into_arc());
        assert_eq!(registry.len(), 1);
        assert!(!registry.get("ollama").unwrap().is_available());
    }

    #[tokio::test]
    async fn unavailable_provider_never_reaches_backend() {
        let stub = StubProvider::new("ollama").unavailable().respond("hello");
        let request = GenerationRequest::new("hi");

        assert_eq!(stub.generate(&request).await, None);
        assert_eq!(stub.chat(&[ChatMessage::user("hi")], &request.options).await, None);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn empty_and_failed_results_collapse_to_none() {
        let request = GenerationRequest::new("hi");

        let empty = StubProvider::new("gemini").respond("   ");
        assert_eq!(empty.generate(&request).await, None);
        assert_eq!(empty.calls(), 1);

        let failing = StubProvider::new("openai").fail("HTTP 500");
        assert_eq!(failing.generate(&request).await, None);

        let ok = StubProvider::new("ollama").respond("hello");
        assert_eq!(ok.generate(&request).await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn chat_defaults_to_unsupported() {
        let stub = StubProvider::new("dolphin").respond("out");
        let err = stub
            .try_chat(&[ChatMessage::user("x")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UltimaError::Unsupported { operation: "chat", .. }));
    }
}
