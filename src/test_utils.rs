//! Test utilities for ultima.
//!
//! Provides an instrumented stub adapter and fixture writers for use across
//! unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ultima::test_utils::*;
//!
//! let gemini = StubProvider::new("gemini").respond("").shared();
//! let ollama = StubProvider::new("ollama").respond("hello").shared();
//! assert_eq!(ollama.calls(), 0);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::core::models::{ChatMessage, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::core::provider::{Provider, ProviderKind};
use crate::error::{Result, UltimaError};

// =============================================================================
// Stub Provider
// =============================================================================

/// Shared call journal: provider names in invocation order.
pub type CallJournal = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Scripted adapter with call-count instrumentation.
#[derive(Debug)]
pub struct StubProvider {
    name: String,
    kind: ProviderKind,
    available: bool,
    chat: bool,
    reply: Reply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    journal: Option<CallJournal>,
}

impl StubProvider {
    /// Available stub that answers with its own name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ProviderKind::from_cli_name(name).unwrap_or(ProviderKind::Ollama),
            available: true,
            chat: false,
            reply: Reply::Text(format!("{name} says hi")),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    /// Mark the probe as failed.
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Answer every call with `text` (may be empty).
    #[must_use]
    pub fn respond(mut self, text: &str) -> Self {
        self.reply = Reply::Text(text.to_string());
        self
    }

    /// Fail every call with a provider API error.
    #[must_use]
    pub fn fail(mut self, reason: &str) -> Self {
        self.reply = Reply::Fail(reason.to_string());
        self
    }

    /// Answer chat calls too (default: chat unsupported).
    #[must_use]
    pub const fn with_chat(mut self) -> Self {
        self.chat = true;
        self
    }

    /// Append the provider name to `journal` on each backend call.
    #[must_use]
    pub fn with_journal(mut self, journal: &CallJournal) -> Self {
        self.journal = Some(Arc::clone(journal));
        self
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn into_arc(self) -> Arc<dyn Provider> {
        Arc::new(self)
    }

    /// Number of backend calls that reached this stub.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(journal) = &self.journal {
            if let Ok(mut journal) = journal.lock() {
                journal.push(self.name.clone());
            }
        }
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(reason) => Err(UltimaError::ProviderApiError {
                provider: self.name.clone(),
                status_code: Some(500),
                message: reason.clone(),
            }),
        }
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn default_model(&self) -> Option<&str> {
        Some("stub-model")
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        self.record(&request.prompt)
    }

    async fn try_chat(
        &self,
        history: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String> {
        if !self.chat {
            return Err(UltimaError::Unsupported {
                provider: self.name.clone(),
                operation: "chat",
            });
        }
        let last = history.last().map(|m| m.content.as_str()).unwrap_or_default();
        self.record(last)
    }

    async fn status(&self) -> ProviderStatus {
        ProviderStatus {
            available: self.available,
            model: Some("stub-model".to_string()),
            ..ProviderStatus::default()
        }
    }
}

// =============================================================================
// Fixture Writers
// =============================================================================

/// Current time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Write a Claude-style credentials file expiring at `expires_at_ms`.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[must_use]
pub fn write_credentials_file(dir: &Path, expires_at_ms: i64) -> PathBuf {
    let path = dir.join(".credentials.json");
    let body = json!({
        "claudeAiOauth": {
            "accessToken": "sk-ant-REDACTED",
            "refreshToken": "sk-ant-REDACTED",
            "expiresAt": expires_at_ms,
            "subscriptionType": "max",
            "rateLimitTier": "default_claude_max_20x",
            "scopes": ["user:inference", "user:profile"]
        }
    });
    fs::write(&path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    path
}

/// Write a `KEY=value` keys file.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[must_use]
pub fn write_keys_file(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("keys.env");
    fs::write(&path, contents).unwrap();
    path
}

/// Create a Dolphin-style project whose scripts are shell files.
///
/// Each `(name, body)` pair becomes `<root>/scripts/<name>`.
///
/// # Panics
///
/// Panics if the directories or files cannot be created.
#[must_use]
pub fn make_script_project(root: &Path, scripts: &[(&str, &str)]) -> PathBuf {
    let scripts_dir = root.join("scripts");
    fs::create_dir_all(&scripts_dir).unwrap();
    for (name, body) in scripts {
        fs::write(scripts_dir.join(name), body).unwrap();
    }
    root.to_path_buf()
}
