//! Credentials command implementation.

use crate::cli::args::OutputFormat;
use crate::cli::emit;
use crate::core::credentials::OAuthCredentials;
use crate::error::Result;
use crate::render::{self, CredentialsSummary};
use crate::storage::Config;

/// Show the stored Claude OAuth credentials without exposing full tokens.
pub fn execute(config: &Config, format: OutputFormat, pretty: bool, no_color: bool) -> Result<()> {
    let path = config.claude.credentials_path();
    let credentials = OAuthCredentials::load(&path)?;
    if credentials.is_none() {
        tracing::info!(?path, "No OAuth credentials found");
    }

    let summary = CredentialsSummary::new(&path, credentials.as_ref());
    emit(&render::render_credentials(&summary, format, pretty, no_color)?);
    Ok(())
}
