//! Generative Language REST backend.
//!
//! `POST {base}/v1beta/models/{model}:generateContent`, key in the
//! `x-goog-api-key` header. Assistant turns are sent with role `model`;
//! system turns move into `systemInstruction`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::NAME;
use crate::core::http::{build_client, join_url, send_json};
use crate::core::models::{ChatMessage, ChatRole, GenerationOptions, GenerationRequest, ProviderStatus};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind, non_empty};
use crate::core::secrets::resolve_api_key;
use crate::error::Result;
use crate::storage::GeminiConfig;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Adapter for the hosted Gemini API.
#[derive(Debug)]
pub struct GeminiApiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    probe: Probe,
}

impl GeminiApiProvider {
    /// Build the adapter. Available iff an API key resolves.
    pub async fn probe(config: &GeminiConfig, keys_file: &Path, timeout: Duration) -> Self {
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

    fn body(history: &[ChatMessage], options: &GenerationOptions) -> Value {
        let system: Vec<&str> = history
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let contents: Vec<Value> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| {
                let role = if m.role == ChatRole::Assistant { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = json!({ "contents": contents });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = options.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        generation_config.extend(options.extra.clone());
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }
        body
    }

    async fn send(&self, history: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.probe.require(NAME)?;
        let model = options.model_or(&self.model);
        let url = join_url(&self.base_url, &format!("/v1beta/models/{model}:generateContent"));
        tracing::debug!(provider = NAME, backend = "api", model, "POST generateContent");

        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.as_deref().unwrap_or_default())
            .json(&Self::body(history, options));
        let response: GenerateContentResponse = send_json(request, NAME, self.timeout).await?;
        non_empty(NAME, response.text())
    }
}

#[async_trait]
impl Provider for GeminiApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
