//! Error types for ultima.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into six main categories:
//! - **Authentication**: missing API keys, expired OAuth tokens
//! - **Network**: connection failures and timeouts talking to a backend
//! - **Configuration**: config file parsing, validation, unknown provider names
//! - **Provider**: unavailable providers, API errors, malformed or empty responses
//! - **Environment**: missing binaries, missing scripts, failed subprocesses
//! - **Internal**: I/O, JSON and unclassified errors
//!
//! Each error has a stable error code (e.g., `ULT-P001`) for programmatic handling.
//!
//! Adapter calls return these errors internally; the façade boundary collapses
//! them to an absent result after logging.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication issues (missing keys, expired tokens).
    Authentication,
    /// Network issues (timeout, connection refused).
    Network,
    /// Configuration issues (parse errors, invalid values, unknown names).
    Configuration,
    /// Provider-specific issues (unavailable, API errors, bad responses).
    Provider,
    /// Environment issues (missing binaries or scripts, subprocess failures).
    Environment,
    /// Internal errors (I/O, serialization, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Provider => "Provider error",
            Self::Environment => "Environment error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Provider => "P",
            Self::Environment => "E",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the `ultima` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Generation produced no result, or an unexpected failure
    GeneralError = 1,
    /// Binary or script not found
    BinaryNotFound = 2,
    /// Configuration errors, unknown provider names
    ConfigError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for ultima operations.
#[derive(Error, Debug)]
pub enum UltimaError {
    // ==========================================================================
    // Authentication errors
    // ==========================================================================
    /// No API key or OAuth token could be resolved for the provider.
    #[error("authentication not configured for {provider}")]
    AuthNotConfigured { provider: String },

    /// The stored OAuth access token is past its expiry.
    #[error("access token expired for {provider}; refresh it outside ultima")]
    AuthExpired { provider: String },

    // ==========================================================================
    // Network errors
    // ==========================================================================
    /// Request or subprocess exceeded its time limit.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider name not known to the façade.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    // ==========================================================================
    // Provider errors
    // ==========================================================================
    /// Provider failed its capability probe.
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Every provider in the priority list was unavailable or produced nothing.
    #[error("no provider available (tried {attempted} of {listed})")]
    NoProviderAvailable { attempted: usize, listed: usize },

    /// Backend API answered with a non-success status.
    #[error("provider {provider} API error: {message}")]
    ProviderApiError {
        provider: String,
        status_code: Option<u16>,
        message: String,
    },

    /// Backend answered successfully but without any text.
    #[error("provider {0} returned an empty response")]
    EmptyResponse(String),

    /// Operation not offered by this adapter.
    #[error("provider {provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    /// Failed to parse a backend response.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Environment errors
    // ==========================================================================
    /// Required binary not found in PATH.
    #[error("CLI tool not found: {0}")]
    CliNotFound(String),

    /// Named script does not exist in the script collection.
    #[error("script not found: {0}")]
    ScriptNotFound(String),

    /// Subprocess exited with a non-zero status.
    #[error("{program} exited with code {exit_code}: {stderr}")]
    ProcessFailed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UltimaError {
    /// Map error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::CliNotFound(_) | Self::ScriptNotFound(_) => ExitCode::BinaryNotFound,

            Self::Config(_) | Self::UnknownProvider(_) => ExitCode::ConfigError,

            Self::Timeout(_) => ExitCode::Timeout,

            Self::AuthNotConfigured { .. }
            | Self::AuthExpired { .. }
            | Self::Network(_)
            | Self::ProviderUnavailable { .. }
            | Self::NoProviderAvailable { .. }
            | Self::ProviderApiError { .. }
            | Self::EmptyResponse(_)
            | Self::Unsupported { .. }
            | Self::ParseResponse(_)
            | Self::ProcessFailed { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthNotConfigured { .. } | Self::AuthExpired { .. } => {
                ErrorCategory::Authentication
            }

            Self::Timeout(_) | Self::Network(_) => ErrorCategory::Network,

            Self::Config(_) | Self::UnknownProvider(_) => ErrorCategory::Configuration,

            Self::ProviderUnavailable { .. }
            | Self::NoProviderAvailable { .. }
            | Self::ProviderApiError { .. }
            | Self::EmptyResponse(_)
            | Self::Unsupported { .. }
            | Self::ParseResponse(_) => ErrorCategory::Provider,

            Self::CliNotFound(_) | Self::ScriptNotFound(_) | Self::ProcessFailed { .. } => {
                ErrorCategory::Environment
            }

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `ULT-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AuthNotConfigured { .. } => "ULT-A001",
            Self::AuthExpired { .. } => "ULT-A002",

            Self::Timeout(_) => "ULT-N001",
            Self::Network(_) => "ULT-N099",

            Self::Config(_) => "ULT-C001",
            Self::UnknownProvider(_) => "ULT-C010",

            Self::ProviderUnavailable { .. } => "ULT-P001",
            Self::NoProviderAvailable { .. } => "ULT-P002",
            Self::ProviderApiError { .. } => "ULT-P003",
            Self::EmptyResponse(_) => "ULT-P010",
            Self::Unsupported { .. } => "ULT-P011",
            Self::ParseResponse(_) => "ULT-P020",

            Self::CliNotFound(_) => "ULT-E001",
            Self::ScriptNotFound(_) => "ULT-E002",
            Self::ProcessFailed { .. } => "ULT-E010",

            Self::Io(_) => "ULT-X001",
            Self::Json(_) => "ULT-X002",
            Self::Other(_) => "ULT-X099",
        }
    }

    /// Short actionable hint for human output, when one exists.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnknownProvider(_) => Some(format!(
                "Valid providers: auto, {}",
                crate::core::provider::ProviderKind::ALL
                    .iter()
                    .map(|k| k.cli_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::NoProviderAvailable { .. } => {
                Some("Run `ultima status` to see which backends are usable".to_string())
            }
            Self::AuthNotConfigured { provider } => crate::core::provider::ProviderKind::from_cli_name(provider)
                .ok()
                .map(|kind| kind.auth_suggestion().to_string()),
            Self::AuthExpired { .. } => {
                Some("Sign in again with the Claude CLI to refresh the stored token".to_string())
            }
            Self::CliNotFound(name) => crate::core::provider::ProviderKind::from_cli_name(name)
                .ok()
                .map(|kind| kind.install_suggestion().to_string()),
            Self::Config(_) => Some("Check the file shown by `ultima config show`".to_string()),
            _ => None,
        }
    }
}

/// Result type alias for ultima operations.
pub type Result<T> = std::result::Result<T, UltimaError>;
