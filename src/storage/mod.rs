//! Storage for configuration and application paths.

pub mod config;
pub mod paths;

pub use config::{
    ClaudeConfig, Config, ConfigSource, ConfigSources, DolphinConfig, ENV_CONFIG, ENV_PRIORITY,
    ENV_TIMEOUT, GeminiBackend, GeminiConfig, GeneralConfig, OllamaConfig, OpenAIConfig,
    ResolvedConfig,
};
pub use paths::AppPaths;
