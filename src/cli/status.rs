//! Status and model listing commands.

use crate::cli::args::OutputFormat;
use crate::cli::emit;
use crate::core::facade::Ultima;
use crate::error::Result;
use crate::providers::OllamaProvider;
use crate::render;
use crate::storage::Config;

/// Execute the status command.
pub async fn execute(config: &Config, format: OutputFormat, pretty: bool, no_color: bool) -> Result<()> {
    let ultima = Ultima::from_config(config).await;
    let report = ultima.status_report().await;
    tracing::debug!(
        available = report.available_count(),
        total = report.providers.len(),
        "Status collected"
    );
    emit(&render::render_status(&report, format, pretty, no_color)?);
    Ok(())
}

/// List models installed in the local Ollama server.
pub async fn models(config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let ollama = OllamaProvider::probe(&config.ollama, config.general.timeout()).await;
    let models = ollama.try_list_models().await?;
    let title = format!("Models at {}", ollama.base_url());
    emit(&render::render_list(&title, &models, format, pretty)?);
    Ok(())
}
