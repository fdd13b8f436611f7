//! Config command implementation.

use serde::Serialize;

use crate::cli::args::{ConfigCommand, OutputFormat};
use crate::cli::emit;
use crate::error::{Result, UltimaError};
use crate::render::robot;
use crate::storage::{Config, ResolvedConfig};

const REDACTED: &str = "********";

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    path: String,
    exists: bool,
    path_source: String,
    priority_source: String,
    timeout_source: String,
    config: &'a Config,
}

/// Execute a config subcommand.
pub fn execute(
    command: &ConfigCommand,
    resolved: &ResolvedConfig,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => init(resolved, *force),
        ConfigCommand::Show => show(resolved, format, pretty),
    }
}

fn init(resolved: &ResolvedConfig, force: bool) -> Result<()> {
    let path = &resolved.path;
    if path.exists() && !force {
        return Err(UltimaError::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    Config::default().save_to(path)?;
    tracing::info!(?path, "Wrote default config");
    println!("Wrote {}", path.display());
    Ok(())
}

/// Copy of `config` with explicit API keys masked.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    for key in [
        &mut config.gemini.api_key,
        &mut config.claude.api_key,
        &mut config.openai.api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    }
    config
}

fn show(resolved: &ResolvedConfig, format: OutputFormat, pretty: bool) -> Result<()> {
    let config = redacted(&resolved.config);
    let view = ConfigView {
        path: resolved.path.display().to_string(),
        exists: resolved.path.exists(),
        path_source: resolved.sources.path.to_string(),
        priority_source: resolved.sources.priority.to_string(),
        timeout_source: resolved.sources.timeout.to_string(),
        config: &config,
    };

    match format {
        OutputFormat::Json => emit(&robot::render(&view, pretty)?),
        OutputFormat::Human => {
            let body = toml::to_string_pretty(&config)
                .map_err(|e| UltimaError::Config(format!("Failed to serialize config: {e}")))?;
            println!(
                "Config file: {} ({}, {})",
                view.path,
                view.path_source,
                if view.exists { "found" } else { "not found, using defaults" }
            );
            println!("Priority from: {}", view.priority_source);
            println!("Timeout from:  {}", view.timeout_source);
            println!();
            emit(&body);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_only_present_keys() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        let masked = redacted(&config);
        assert_eq!(masked.openai.api_key.as_deref(), Some(REDACTED));
        assert!(masked.claude.api_key.is_none());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\n").unwrap();
        let resolved = ResolvedConfig::resolve_with(Some(&path), |_| None).unwrap();

        let err = init(&resolved, false).unwrap_err();
        assert!(matches!(err, UltimaError::Config(_)));

        init(&resolved, true).unwrap();
        let written = Config::load_from(&path).unwrap();
        assert_eq!(written.general.timeout_seconds, 120);
    }
}
