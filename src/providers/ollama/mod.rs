//! Ollama local inference server.
//!
//! Endpoints:
//! - `POST /api/generate` single-prompt completion
//! - `POST /api/chat` multi-turn exchange
//! - `GET /api/tags` installed models
//!
//! All requests set `stream: false`; the server answers with one JSON body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::http::{build_client, join_url, send_json};
use crate::core::models::{ChatMessage, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind, non_empty};
use crate::error::Result;
use crate::storage::OllamaConfig;

const NAME: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Adapter for a local Ollama server.
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    probe: Probe,
}

impl OllamaProvider {
    /// Build the adapter and run its capability probe.
    ///
    /// The probe only checks that the base URL parses and the HTTP client
    /// builds; an unreachable server surfaces later as a call failure.
    pub async fn probe(config: &OllamaConfig, timeout: Duration) -> Self {
        let client = build_client(timeout);
        let probe = if !config.enabled {
            Probe::disabled(NAME)
        } else if let Err(e) = Url::parse(&config.base_url) {
            Probe::failed(NAME, format!("invalid base URL '{}': {e}", config.base_url))
        } else if let Err(e) = &client {
            Probe::failed(NAME, e.to_string())
        } else {
            Probe::ready()
        };

        Self {
            client: client.unwrap_or_default(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout,
            probe,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of installed models; empty when unavailable or on any failure.
    pub async fn list_models(&self) -> Vec<String> {
        if !self.probe.is_available() {
            return Vec::new();
        }
        match self.try_list_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(provider = NAME, error_code = e.error_code(), "Listing models failed: {e}");
                Vec::new()
            }
        }
    }

    /// Installed models as a discriminated result.
    ///
    /// # Errors
    ///
    /// Returns the transport, HTTP or parse failure.
    pub async fn try_list_models(&self) -> Result<Vec<String>> {
        self.probe.require(NAME)?;
        let url = join_url(&self.base_url, "/api/tags");
        let tags: TagsResponse = send_json(self.client.get(url), NAME, self.timeout).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn options(options: &GenerationOptions) -> Map<String, Value> {
        let mut map = options.extra.clone();
        if let Some(temperature) = options.temperature {
            map.insert("temperature".to_string(), Value::from(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            map.insert("num_predict".to_string(), Value::from(max_tokens));
        }
        map
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn is_available(&self) -> bool {
        self.probe.is_available()
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        self.probe.require(NAME)?;
        let model = request.options.model_or(&self.model);
        let body = GenerateBody {
            model,
            prompt: &request.prompt,
            stream: false,
            options: Self::options(&request.options),
        };
        tracing::debug!(provider = NAME, model, "POST /api/generate");

        let url = join_url(&self.base_url, "/api/generate");
        let response: GenerateResponse =
            send_json(self.client.post(url).json(&body), NAME, self.timeout).await?;
        non_empty(NAME, response.response)
    }

    async fn try_chat(&self, history: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.probe.require(NAME)?;
        let model = options.model_or(&self.model);
        let body = ChatBody {
            model,
            messages: history,
            stream: false,
            options: Self::options(options),
        };
        tracing::debug!(provider = NAME, model, turns = history.len(), "POST /api/chat");

        let url = join_url(&self.base_url, "/api/chat");
        let response: ChatResponse =
            send_json(self.client.post(url).json(&body), NAME, self.timeout).await?;
        non_empty(NAME, response.message.content)
    }

    async fn status(&self) -> ProviderStatus {
        if !self.probe.is_available() {
            return ProviderStatus::unavailable(self.probe.reason().map(str::to_string));
        }
        ProviderStatus {
            available: true,
            model: Some(self.model.clone()),
            models: self.list_models().await,
            path: Some(self.base_url.clone()),
            ..ProviderStatus::default()
        }
    }
}
