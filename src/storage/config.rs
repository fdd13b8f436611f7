//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/ultima/config.toml`
//! - macOS: `~/Library/Application Support/ultima/config.toml`
//! - Windows: `%APPDATA%/ultima/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags (`--config`)
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `ULTIMA_CONFIG`: Override config file path
//! - `ULTIMA_PRIORITY`: Comma-separated auto-mode order (e.g., "ollama,gemini")
//! - `ULTIMA_TIMEOUT`: Default timeout in seconds

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use super::paths::home_dir;
use crate::core::credentials::default_credentials_path;
use crate::core::http::DEFAULT_TIMEOUT;
use crate::core::provider::ProviderKind;
use crate::error::{Result, UltimaError};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "ULTIMA_CONFIG";
/// Environment variable for comma-separated priority list.
pub const ENV_PRIORITY: &str = "ULTIMA_PRIORITY";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "ULTIMA_TIMEOUT";

/// Upper bound for `timeout_seconds`.
const MAX_TIMEOUT_SECONDS: u64 = 600;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Configuration after merging the CLI path, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// File the config was read from (may not exist).
    pub path: PathBuf,
    /// Source of each overridable setting.
    pub sources: ConfigSources,
}

/// Tracks the source of each overridable configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub path: ConfigSource,
    pub priority: ConfigSource,
    pub timeout: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve the final configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or an
    /// environment override holds an invalid value.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(cli_path, |key| std::env::var(key).ok())
    }

    /// Resolve with an injected environment lookup.
    ///
    /// # Errors
    ///
    /// See [`ResolvedConfig::resolve`].
    pub fn resolve_with(
        cli_path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut sources = ConfigSources::default();

        let path = if let Some(path) = cli_path {
            sources.path = ConfigSource::Cli;
            path.to_path_buf()
        } else if let Some(path) = env(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
            sources.path = ConfigSource::Env;
            PathBuf::from(path)
        } else {
            sources.path = ConfigSource::Default;
            Config::config_path()
        };

        let mut config = Config::load_from(&path)?;
        if path.exists() {
            sources.priority = ConfigSource::ConfigFile;
            sources.timeout = ConfigSource::ConfigFile;
        }

        if let Some(priority) = env(ENV_PRIORITY).filter(|p| !p.trim().is_empty()) {
            sources.priority = ConfigSource::Env;
            config.general.priority = priority
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(timeout) = env(ENV_TIMEOUT) {
            let seconds = timeout.trim().parse::<u64>().map_err(|_| {
                UltimaError::Config(format!("{ENV_TIMEOUT} must be a number of seconds, got '{timeout}'"))
            })?;
            sources.timeout = ConfigSource::Env;
            config.general.timeout_seconds = seconds;
        }

        config.validate()?;

        Ok(Self {
            config,
            path,
            sources,
        })
    }
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub ollama: OllamaConfig,
    pub dolphin: DolphinConfig,
    pub gemini: GeminiConfig,
    pub claude: ClaudeConfig,
    pub openai: OpenAIConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Ceiling for HTTP requests and subprocesses, in seconds.
    pub timeout_seconds: u64,
    /// Auto-mode order; earlier entries win.
    pub priority: Vec<String>,
    /// Fallback `KEY=value` file for API keys.
    pub keys_file: Option<PathBuf>,
}

/// Local inference server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
}

/// Script-runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DolphinConfig {
    pub enabled: bool,
    /// Project root; defaults to `~/dolphin`.
    pub path: Option<PathBuf>,
    pub interpreter: String,
    /// Scripts directory relative to the project root.
    pub scripts_dir: String,
    /// Script used by `generate` and `dolphin_command`.
    pub default_script: String,
}

/// Which Gemini integration backs the `gemini` provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeminiBackend {
    /// The `gemini` CLI as a subprocess.
    #[default]
    Cli,
    /// The Generative Language REST API.
    Api,
}

/// Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub enabled: bool,
    pub backend: GeminiBackend,
    pub binary: String,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

/// Claude settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeConfig {
    pub enabled: bool,
    /// OAuth credentials file; defaults to `~/.claude/.credentials.json`.
    pub credentials_path: Option<PathBuf>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

/// OpenAI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            priority: ProviderKind::DEFAULT_PRIORITY
                .iter()
                .map(|k| k.cli_name().to_string())
                .collect(),
            keys_file: None,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
        }
    }
}

impl Default for DolphinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            interpreter: "node".to_string(),
            scripts_dir: "scripts".to_string(),
            default_script: "dolphin.mjs".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: GeminiBackend::Cli,
            binary: "gemini".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            credentials_path: None,
            model: "claude-3-5-sonnet-latest".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Keys file, falling back to `<config dir>/keys.env`.
    #[must_use]
    pub fn keys_file(&self) -> PathBuf {
        self.keys_file
            .clone()
            .unwrap_or_else(|| AppPaths::new().keys_file())
    }
}

impl DolphinConfig {
    /// Project root, falling back to `~/dolphin`.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dolphin")
        })
    }
}

impl ClaudeConfig {
    /// Credentials file, falling back to `~/.claude/.credentials.json`.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .or_else(default_credentials_path)
            .unwrap_or_else(|| PathBuf::from(".credentials.json"))
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| UltimaError::Config(format!("Invalid config file {}: {e}", path.display())))?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| UltimaError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Priority names are known providers and not repeated
    /// - Timeout is within bounds (1-600 seconds)
    ///
    /// # Errors
    ///
    /// Returns a `Config` error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ProviderKind::ALL
            .iter()
            .map(|provider| provider.cli_name())
            .collect::<Vec<_>>()
            .join(", ");

        let mut seen = Vec::new();
        for name in &self.general.priority {
            let kind = ProviderKind::from_cli_name(name).map_err(|_| {
                UltimaError::Config(format!(
                    "Invalid provider \"{name}\" in priority. Valid providers: {valid_providers}",
                ))
            })?;
            if seen.contains(&kind) {
                return Err(UltimaError::Config(format!(
                    "Provider \"{name}\" appears more than once in priority"
                )));
            }
            seen.push(kind);
        }

        if self.general.timeout_seconds == 0 || self.general.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(UltimaError::Config(format!(
                "Timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"
            )));
        }

        Ok(())
    }
}
