//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::core::credentials::OAuthCredentials;
use crate::core::facade::DispatchOutcome;
use crate::core::models::StatusReport;
use crate::error::Result;
use crate::util::format_countdown_from;

/// Characters of a token shown in output.
pub const TOKEN_PREFIX_LEN: usize = 20;

/// Display-safe view of the stored OAuth credentials. Never holds a full
/// token.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsSummary {
    pub path: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,
    pub token_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_tier: Option<String>,
    pub scopes: Vec<String>,
}

impl CredentialsSummary {
    #[must_use]
    pub fn new(path: &Path, credentials: Option<&OAuthCredentials>) -> Self {
        Self::at(path, credentials, Utc::now())
    }

    /// Summary evaluated at `now`.
    #[must_use]
    pub fn at(path: &Path, credentials: Option<&OAuthCredentials>, now: DateTime<Utc>) -> Self {
        let prefix = |token: &str| format!("{}...", OAuthCredentials::token_prefix(token, TOKEN_PREFIX_LEN));
        let access = credentials.and_then(OAuthCredentials::access_token);
        let refresh = credentials.and_then(OAuthCredentials::refresh_token);
        let expires_at = credentials.and_then(OAuthCredentials::expires_at);

        Self {
            path: path.display().to_string(),
            found: credentials.is_some(),
            access_token_prefix: access.map(prefix),
            access_token_length: access.map(|t| t.chars().count()),
            refresh_token_prefix: refresh.map(prefix),
            refresh_token_length: refresh.map(|t| t.chars().count()),
            expires_at,
            time_remaining: expires_at.map(|at| format_countdown_from(at, now)),
            token_valid: credentials.is_some_and(|c| c.is_token_valid_at(now.timestamp_millis())),
            subscription_type: credentials
                .and_then(OAuthCredentials::subscription_type)
                .map(str::to_string),
            rate_limit_tier: credentials
                .and_then(OAuthCredentials::rate_limit_tier)
                .map(str::to_string),
            scopes: credentials
                .map(|c| c.scopes().to_vec())
                .unwrap_or_default(),
        }
    }
}

/// Render the status report.
pub fn render_status(
    report: &StatusReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_status(report, no_color)),
        OutputFormat::Json => robot::render(report, pretty),
    }
}

/// Render a generation or chat outcome.
pub fn render_outcome(outcome: &DispatchOutcome, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_outcome(outcome)),
        OutputFormat::Json => robot::render(&robot::OutcomeOutput::from(outcome), pretty),
    }
}

/// Render the credentials view.
pub fn render_credentials(
    summary: &CredentialsSummary,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_credentials(summary, no_color)),
        OutputFormat::Json => robot::render(summary, pretty),
    }
}

/// Render a titled list of names (models, scripts).
pub fn render_list(
    title: &str,
    items: &[String],
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_list(title, items)),
        OutputFormat::Json => robot::render(&items, pretty),
    }
}
