//! Claude (Anthropic) provider.
//!
//! Auth sources, in order:
//! - API key (`x-api-key`), from config, `ANTHROPIC_API_KEY`, or the keys file
//! - OAuth access token from `~/.claude/.credentials.json`, sent as a bearer
//!   token with the OAuth beta header
//!
//! An expired OAuth token fails before any request is made. Tokens are
//! never refreshed here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::credentials::OAuthCredentials;
use crate::core::http::{build_client, join_url, send_json};
use crate::core::models::{ChatMessage, ChatRole, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind, non_empty};
use crate::core::secrets::resolve_api_key;
use crate::error::{Result, UltimaError};
use crate::storage::ClaudeConfig;

const NAME: &str = "claude";

/// Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Beta flag required for OAuth bearer tokens.
const OAUTH_BETA: &str = "oauth-2025-04-20";

/// Body fields the adapter fills in; `extra` may not override them.
const RESERVED_FIELDS: &[&str] = &["model", "messages", "max_tokens", "temperature", "system", "stream"];

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaudeAuth<'a> {
    ApiKey(&'a str),
    OAuth(&'a str),
}

impl ClaudeAuth<'_> {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api key",
            Self::OAuth(_) => "oauth",
        }
    }

    fn apply(self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => request.header("x-api-key", key),
            Self::OAuth(token) => request
                .bearer_auth(token)
                .header("anthropic-beta", OAUTH_BETA),
        }
    }
}

/// Adapter for the Anthropic Messages API.
#[derive(Debug)]
pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    credentials: Option<OAuthCredentials>,
    credentials_path: PathBuf,
    timeout: Duration,
    probe: Probe,
}

impl ClaudeProvider {
    /// Build the adapter. Available iff an API key resolves or the
    /// credentials file yields an access token.
    pub async fn probe(config: &ClaudeConfig, keys_file: &Path, timeout: Duration) -> Self {
        let credentials_path = config.credentials_path();
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env, Some(keys_file));
        let credentials = match OAuthCredentials::load(&credentials_path) {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(provider = NAME, path = %credentials_path.display(), "Error loading Claude credentials: {e}");
                None
            }
        };
        let has_token = credentials
            .as_ref()
            .is_some_and(|c| c.access_token().is_some());

        let client = build_client(timeout);
        let probe = if !config.enabled {
            Probe::disabled(NAME)
        } else if api_key.is_none() && !has_token {
            Probe::failed(
                NAME,
                format!(
                    "Claude credentials not found at: {} and {} not set",
                    credentials_path.display(),
                    config.api_key_env
                ),
            )
        } else if let Err(e) = &client {
            Probe::failed(NAME, e.to_string())
        } else {
            Probe::ready()
        };

        Self {
            client: client.unwrap_or_default(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            credentials,
            credentials_path,
            timeout,
            probe,
        }
    }

    /// Credential snapshot loaded at construction.
    #[must_use]
    pub const fn credentials(&self) -> Option<&OAuthCredentials> {
        self.credentials.as_ref()
    }

    #[must_use]
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().and_then(OAuthCredentials::access_token)
    }

    /// `false` when there are no credentials.
    #[must_use]
    pub fn is_token_valid(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(OAuthCredentials::is_token_valid)
    }

    #[must_use]
    pub fn subscription_type(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .and_then(OAuthCredentials::subscription_type)
    }

    /// Pick the auth method for the next request.
    ///
    /// # Errors
    ///
    /// - `AuthExpired` when only an expired OAuth token is available
    /// - `AuthNotConfigured` when nothing is available
    pub fn auth(&self) -> Result<ClaudeAuth<'_>> {
        if let Some(key) = self.api_key.as_deref() {
            return Ok(ClaudeAuth::ApiKey(key));
        }
        match self.access_token() {
            Some(_) if !self.is_token_valid() => Err(UltimaError::AuthExpired {
                provider: NAME.to_string(),
            }),
            Some(token) => Ok(ClaudeAuth::OAuth(token)),
            None => Err(UltimaError::AuthNotConfigured {
                provider: NAME.to_string(),
            }),
        }
    }

    fn body(&self, history: &[ChatMessage], options: &GenerationOptions) -> Value {
        let system: Vec<&str> = history
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let messages: Vec<Value> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": options.model_or(&self.model),
            "max_tokens": options.max_tokens.unwrap_or(self.max_tokens),
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        for (key, value) in options.extra_without(NAME, RESERVED_FIELDS) {
            body[key.as_str()] = value;
        }
        body
    }

    async fn send(&self, history: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.probe.require(NAME)?;
        let auth = self.auth()?;
        let body = self.body(history, options);
        tracing::debug!(provider = NAME, auth = auth.label(), model = %body["model"], "POST /v1/messages");

        let request = auth.apply(
            self.client
                .post(join_url(&self.base_url, "/v1/messages"))
                .header("anthropic-version", API_VERSION)
                .json(&body),
        );
        let response: MessagesResponse = send_json(request, NAME, self.timeout).await?;
        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<String>();
        non_empty(NAME, text)
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn is_available(&self) -> bool {
        self.probe.is_available()
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        self.send(&[ChatMessage::user(request.prompt.clone())], &request.options)
            .await
    }

    async fn try_chat(&self, history: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.send(history, options).await
    }

    async fn status(&self) -> ProviderStatus {
        if !self.probe.is_available() {
            return ProviderStatus::unavailable(self.probe.reason().map(str::to_string));
        }
        ProviderStatus {
            available: true,
            model: Some(self.model.clone()),
            auth: self.auth().ok().map(|a| a.label().to_string()),
            subscription: self.subscription_type().map(str::to_string),
            token_valid: self.credentials.as_ref().map(OAuthCredentials::is_token_valid),
            ..ProviderStatus::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{now_ms, write_credentials_file};

    fn config_with(credentials_path: PathBuf, api_key: Option<&str>) -> ClaudeConfig {
        ClaudeConfig {
            credentials_path: Some(credentials_path),
            api_key: api_key.map(str::to_string),
            api_key_env: "ULTIMA_TEST_ANTHROPIC_KEY_UNSET".to_string(),
            ..ClaudeConfig::default()
        }
    }

    const NO_KEYS: &str = "/nonexistent/keys.env";

    #[tokio::test]
    async fn no_credentials_and_no_key_is_unavailable() {
        let config = config_with(PathBuf::from("/nonexistent/.credentials.json"), None);
        let claude = ClaudeProvider::probe(&config, Path::new(NO_KEYS), Duration::from_secs(5)).await;
        assert!(!claude.is_available());
        assert!(!claude.is_token_valid());
        assert_eq!(claude.subscription_type(), None);
    }

    #[tokio::test]
    async fn credentials_file_enables_oauth() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_credentials_file(dir.path(), now_ms() + 3_600_000);
        let claude = ClaudeProvider::probe(&config_with(path, None), Path::new(NO_KEYS), Duration::from_secs(5)).await;

        assert!(claude.is_available());
        assert!(claude.is_token_valid());
        assert_eq!(claude.subscription_type(), Some("max"));
        assert_eq!(claude.auth().unwrap().label(), "oauth");

        let status = claude.status().await;
        assert_eq!(status.token_valid, Some(true));
        assert_eq!(status.subscription.as_deref(), Some("max"));
    }

    #[tokio::test]
    async fn expired_token_fails_before_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_credentials_file(dir.path(), now_ms() - 1_000);
        let claude = ClaudeProvider::probe(&config_with(path, None), Path::new(NO_KEYS), Duration::from_secs(5)).await;

        assert!(claude.is_available());
        let err = claude
            .try_generate(&GenerationRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, UltimaError::AuthExpired { .. }));
    }

    #[tokio::test]
    async fn api_key_takes_precedence_over_oauth() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_credentials_file(dir.path(), now_ms() - 1_000);
        let claude = ClaudeProvider::probe(
            &config_with(path, Some("sk-ant-api-test")),
            Path::new(NO_KEYS),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(claude.auth().unwrap(), ClaudeAuth::ApiKey("sk-ant-api-test"));
    }

    #[tokio::test]
    async fn body_moves_system_turns() {
        let config = config_with(PathBuf::from("/nonexistent"), Some("k"));
        let claude = ClaudeProvider::probe(&config, Path::new(NO_KEYS), Duration::from_secs(5)).await;
        let body = claude.body(
            &[ChatMessage::system("terse"), ChatMessage::user("hi")],
            &GenerationOptions::default().with_temperature(0.0),
        );
        assert_eq!(body["system"], "terse");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["model"], "claude-3-5-sonnet-latest");
    }

    #[tokio::test]
    async fn extra_options_cannot_replace_core_fields() {
        let config = config_with(PathBuf::from("/nonexistent"), Some("k"));
        let claude = ClaudeProvider::probe(&config, Path::new(NO_KEYS), Duration::from_secs(5)).await;
        let body = claude.body(
            &[ChatMessage::user("hi")],
            &GenerationOptions::default()
                .with_extra("model", "claude-x")
                .with_extra("max_tokens", 1)
                .with_extra("messages", "boom")
                .with_extra("top_k", 5),
        );
        let raw = serde_json::to_string(&body).unwrap();
        assert_eq!(raw.matches("\"model\"").count(), 1);
        assert_eq!(body["model"], "claude-3-5-sonnet-latest");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["top_k"], 5);
    }
}
