//! OpenAI chat completions provider.
//!
//! `POST {base}/v1/chat/completions` with a bearer key. Works against any
//! OpenAI-compatible server by pointing `[openai].base_url` at it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::http::{build_client, join_url, send_json};
use crate::core::models::{ChatMessage, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind, non_empty};
use crate::core::secrets::resolve_api_key;
use crate::error::Result;
use crate::storage::OpenAIConfig;

const NAME: &str = "openai";

/// Body fields the adapter fills in; `extra` may not override them.
const RESERVED_FIELDS: &[&str] = &["model", "messages", "max_tokens", "temperature", "system", "stream"];

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter for the OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    probe: Probe,
}

impl OpenAIProvider {
    /// Build the adapter. Available iff an API key resolves.
    pub async fn probe(config: &OpenAIConfig, keys_file: &Path, timeout: Duration) -> Self {
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env, Some(keys_file));
        let client = build_client(timeout);
        let probe = if !config.enabled {
            Probe::disabled(NAME)
        } else if api_key.is_none() {
            Probe::failed(NAME, format!("{} not set", config.api_key_env))
        } else if let Err(e) = &client {
            Probe::failed(NAME, e.to_string())
        } else {
            Probe::ready()
        };

        Self {
            client: client.unwrap_or_default(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            timeout,
            probe,
        }
    }

    fn body<'a>(&'a self, messages: &'a [ChatMessage], options: &'a GenerationOptions) -> CompletionRequest<'a> {
        CompletionRequest {
            model: options.model_or(&self.model),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            extra: options.extra_without(NAME, RESERVED_FIELDS),
        }
    }

    async fn send(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.probe.require(NAME)?;
        let body = self.body(messages, options);
        tracing::debug!(provider = NAME, model = body.model, "POST /v1/chat/completions");

        let request = self
            .client
            .post(join_url(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&body);
        let response: CompletionResponse = send_json(request, NAME, self.timeout).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(NAME, text)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
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
            auth: Some("api key".to_string()),
            ..ProviderStatus::default()
        }
    }
}
