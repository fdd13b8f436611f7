//! `gemini` CLI backend.
//!
//! - generate: `gemini generate --model M [--temperature T] [--max-tokens N] <prompt>`
//! - chat: `gemini chat <last user message>`
//!
//! The version string is read once by the probe and cached.

use std::time::Duration;

use async_trait::async_trait;

use super::NAME;
use crate::core::cli_runner::{PROBE_TIMEOUT, is_on_path, run_command};
use crate::core::models::{
    ChatMessage, GenerationOptions, GenerationRequest, ProviderStatus, last_user_message,
};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind, non_empty};
use crate::error::{Result, UltimaError};
use crate::storage::GeminiConfig;

/// Adapter for the `gemini` command-line tool.
#[derive(Debug)]
pub struct GeminiCliProvider {
    binary: String,
    model: String,
    version: Option<String>,
    timeout: Duration,
    probe: Probe,
}

impl GeminiCliProvider {
    /// Build the adapter. Available iff the binary resolves and
    /// `<binary> --version` exits 0.
    pub async fn probe(config: &GeminiConfig, timeout: Duration) -> Self {
        let (probe, version) = if !config.enabled {
            (Probe::disabled(NAME), None)
        } else if !is_on_path(&config.binary) {
            (
                Probe::failed(NAME, format!("{} not available in PATH", config.binary)),
                None,
            )
        } else {
            match run_command(&config.binary, &["--version"], None, PROBE_TIMEOUT).await {
                Ok(output) if output.success() => {
                    (Probe::ready(), Some(output.stdout.trim().to_string()))
                }
                Ok(output) => (
                    Probe::failed(
                        NAME,
                        format!("{} --version exited with {}", config.binary, output.exit_code),
                    ),
                    None,
                ),
                Err(e) => (Probe::failed(NAME, e.to_string()), None),
            }
        };

        Self {
            binary: config.binary.clone(),
            model: config.model.clone(),
            version: version.filter(|v| !v.is_empty()),
            timeout,
            probe,
        }
    }

    /// Version reported during the probe.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn generate_args(&self, request: &GenerationRequest) -> Vec<String> {
        let options = &request.options;
        let mut args = vec![
            "generate".to_string(),
            "--model".to_string(),
            options.model_or(&self.model).to_string(),
        ];
        if let Some(temperature) = options.temperature {
            args.push("--temperature".to_string());
            args.push(temperature.to_string());
        }
        if let Some(max_tokens) = options.max_tokens {
            args.push("--max-tokens".to_string());
            args.push(max_tokens.to_string());
        }
        args.push(request.prompt.clone());
        args
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        self.probe.require(NAME)?;
        let stdout = run_command(&self.binary, args, None, self.timeout)
            .await?
            .into_stdout(&self.binary)?;
        non_empty(NAME, stdout)
    }
}

#[async_trait]
impl Provider for GeminiCliProvider {
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
        let args = self.generate_args(request);
        tracing::debug!(provider = NAME, backend = "cli", model = %args[2], "Running gemini generate");
        self.run(&args).await
    }

    async fn try_chat(&self, history: &[ChatMessage], _options: &GenerationOptions) -> Result<String> {
        let message = last_user_message(history).ok_or_else(|| {
            UltimaError::Other(anyhow::anyhow!("chat history has no user message"))
        })?;
        self.run(&["chat".to_string(), message.content.clone()]).await
    }

    async fn status(&self) -> ProviderStatus {
        if !self.probe.is_available() {
            return ProviderStatus::unavailable(self.probe.reason().map(str::to_string));
        }
        ProviderStatus {
            available: true,
            model: Some(self.model.clone()),
            version: self.version.clone(),
            path: which::which(&self.binary)
                .ok()
                .map(|p| p.display().to_string()),
            ..ProviderStatus::default()
        }
    }
}
