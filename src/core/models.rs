//! Request, chat and status data models shared by every adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, UltimaError};

// =============================================================================
// Chat Messages
// =============================================================================

/// Speaker of a chat turn.
///
/// Adapters map these onto their backend vocabulary (Gemini calls the
/// assistant `model`, Anthropic moves system turns to a separate field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Parse from a role name (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" | "model" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a multi-turn exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

/// Parses `role:content`, e.g. `user:What is AI?`.
impl FromStr for ChatMessage {
    type Err = UltimaError;

    fn from_str(s: &str) -> Result<Self> {
        let (role, content) = s.split_once(':').ok_or_else(|| {
            UltimaError::Config(format!("chat message '{s}' must look like role:content"))
        })?;
        let role = ChatRole::from_arg(role).ok_or_else(|| {
            UltimaError::Config(format!(
                "unknown chat role '{role}'. Valid roles: system, user, assistant"
            ))
        })?;
        Ok(Self::new(role, content.trim_start()))
    }
}

/// Last user turn of a history, if any.
#[must_use]
pub fn last_user_message(history: &[ChatMessage]) -> Option<&ChatMessage> {
    history.iter().rev().find(|m| m.role == ChatRole::User)
}

// =============================================================================
// Generation Request
// =============================================================================

/// Per-call generation options.
///
/// The façade performs no validation; each adapter interprets the fields it
/// understands and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model override; adapters fall back to their configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Free-form backend-specific options.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl GenerationOptions {
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// `extra` minus the keys an adapter sets itself. Dropped keys are logged.
    #[must_use]
    pub fn extra_without(&self, provider: &str, reserved: &[&str]) -> Map<String, Value> {
        self.extra
            .iter()
            .filter(|(key, _)| {
                let clash = reserved.contains(&key.as_str());
                if clash {
                    tracing::warn!(provider, key = key.as_str(), "Ignoring extra option that overrides a request field");
                }
                !clash
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Model to use: the override if set, otherwise `default`.
    #[must_use]
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }
}

/// A single-prompt generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

// =============================================================================
// Status
// =============================================================================

/// Availability snapshot for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub available: bool,
    /// Why the capability probe failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Installed models reported by the backend (local inference only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_valid: Option<bool>,
}

impl ProviderStatus {
    #[must_use]
    pub fn unavailable(reason: Option<String>) -> Self {
        Self {
            available: false,
            reason,
            ..Self::default()
        }
    }
}

/// Snapshot of every provider, rebuilt on each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub system: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Auto-mode priority order.
    pub priority: Vec<String>,
    pub providers: BTreeMap<String, ProviderStatus>,
}

impl StatusReport {
    /// Number of providers whose probe succeeded.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.providers.values().filter(|s| s.available).count()
    }
}
