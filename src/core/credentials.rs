//! OAuth credential snapshot for the Claude integration.
//!
//! Reads `~/.claude/.credentials.json`:
//!
//! ```json
//! {
//!   "claudeAiOauth": {
//!     "accessToken": "...",
//!     "refreshToken": "...",
//!     "expiresAt": 1767225600000,
//!     "subscriptionType": "max",
//!     "rateLimitTier": "default_claude_max_20x",
//!     "scopes": ["user:inference", "user:profile"]
//!   }
//! }
//! ```
//!
//! The file is loaded once and never refreshed or written. An expired token
//! simply reports invalid; refreshing it is left to the Claude CLI.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Credentials file relative to the home directory.
pub const CREDENTIALS_RELATIVE_PATH: &str = ".claude/.credentials.json";

/// Default credentials path (`~/.claude/.credentials.json`).
#[must_use]
pub fn default_credentials_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(CREDENTIALS_RELATIVE_PATH))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    #[serde(default)]
    claude_ai_oauth: Option<OAuthCredentials>,
}

/// Token set from the nested `claudeAiOauth` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCredentials {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry in epoch milliseconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub rate_limit_tier: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthCredentials {
    /// Load credentials from `path`.
    ///
    /// Returns `Ok(None)` when the file or the nested object is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!(?path, "Claude credentials not found");
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse credentials JSON content.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON.
    pub fn parse(content: &str) -> Result<Option<Self>> {
        let file: CredentialsFile = serde_json::from_str(content)?;
        Ok(file.claude_ai_oauth)
    }

    /// Access token, if present and non-empty.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    #[must_use]
    pub fn rate_limit_tier(&self) -> Option<&str> {
        self.rate_limit_tier.as_deref()
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(DateTime::from_timestamp_millis)
    }

    /// Whether the access token is valid right now.
    #[must_use]
    pub fn is_token_valid(&self) -> bool {
        self.is_token_valid_at(Utc::now().timestamp_millis())
    }

    /// A token is valid iff `now_ms < expiresAt`. Missing expiry is invalid.
    #[must_use]
    pub fn is_token_valid_at(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now_ms < expires_at)
    }

    /// First `len` characters of the access token, for display.
    #[must_use]
    pub fn token_prefix(token: &str, len: usize) -> String {
        token.chars().take(len).collect()
    }
}
