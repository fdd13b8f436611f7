//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::logging::{LogFormat, LogLevel};
use crate::core::models::GenerationOptions;
use crate::core::provider::ProviderSelection;

/// Unified text generation over local, scripted, and hosted LLM backends.
#[derive(Parser, Debug)]
#[command(name = "ultima")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (overrides ULTIMA_CONFIG)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    /// Log level from `--log-level`, if it names one.
    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::from_arg)
    }

    /// Log format forced by `--json-output`.
    #[must_use]
    pub const fn log_format(&self) -> Option<LogFormat> {
        if self.json_output {
            Some(LogFormat::Json)
        } else {
            None
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which backends are usable (default command)
    Status,

    /// Generate text from a single prompt
    Generate(GenerateArgs),

    /// Multi-turn chat from role:content messages
    Chat(ChatArgs),

    /// Run a script from the Dolphin project
    Script(ScriptArgs),

    /// List scripts in the Dolphin project
    Scripts,

    /// Submit an idea record to the Dolphin project
    Idea {
        /// Idea as a JSON object
        #[arg(value_name = "JSON")]
        json: String,
    },

    /// Run the Dolphin agent in watch mode
    Agent,

    /// Show the stored Claude OAuth credentials
    Credentials,

    /// List models installed in Ollama
    Models,

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Provider selection and generation options shared by `generate` and `chat`.
#[derive(Args, Debug, Clone)]
pub struct DispatchArgs {
    /// Provider name, or "auto" to walk the priority list
    #[arg(short, long, default_value = "auto", value_name = "PROVIDER")]
    pub provider: String,

    /// Model override
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long, value_name = "T")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,
}

impl DispatchArgs {
    #[must_use]
    pub fn selection(&self) -> ProviderSelection {
        ProviderSelection::from_arg(&self.provider)
    }

    #[must_use]
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..GenerationOptions::default()
        }
    }
}

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Prompt text
    pub prompt: String,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

/// Arguments for the `chat` command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Messages as role:content, oldest first (e.g. "user:What is AI?")
    #[arg(required = true, value_name = "ROLE:CONTENT")]
    pub messages: Vec<String>,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

/// Arguments for the `script` command.
#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// Script file name in the scripts directory
    pub name: String,

    /// JSON payload passed to the script through a temporary file
    #[arg(long, value_name = "JSON")]
    pub payload: Option<String>,

    /// Arguments passed through to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration and where it came from
    Show,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
