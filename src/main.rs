//! ultima - unified text generation
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use ultima::cli::{Cli, Commands};
use ultima::core::logging::{self, LogSettings};
use ultima::storage::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = LogSettings::resolve(cli.log_level(), cli.log_format(), cli.verbose);
    logging::init(&settings);

    let format = cli.effective_format();
    let pretty = cli.pretty;
    let stderr_plain = !ultima::util::env::should_color_stderr(cli.no_color);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error_code = e.error_code(), "{}", e);
            let error_output = ultima::render::error::render_error(&e, format, pretty, stderr_plain);
            eprintln!("{error_output}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> ultima::Result<()> {
    let format = cli.effective_format();
    let pretty = cli.pretty;
    let no_color = !ultima::util::env::should_use_color(cli.no_color);

    let resolved = ResolvedConfig::resolve(cli.config.as_deref())?;
    tracing::debug!(path = ?resolved.path, source = %resolved.sources.path, "Config resolved");
    let config = &resolved.config;

    match cli.command {
        // Default to status
        None | Some(Commands::Status) => ultima::cli::status::execute(config, format, pretty, no_color).await,

        Some(Commands::Generate(args)) => ultima::cli::generate::execute(&args, config, format, pretty).await,

        Some(Commands::Chat(args)) => ultima::cli::generate::chat(&args, config, format, pretty).await,

        Some(Commands::Script(args)) => ultima::cli::dolphin::run_script(&args, config, format, pretty).await,

        Some(Commands::Scripts) => ultima::cli::dolphin::list(config, format, pretty).await,

        Some(Commands::Idea { json }) => ultima::cli::dolphin::idea(&json, config, format, pretty).await,

        Some(Commands::Agent) => ultima::cli::dolphin::agent(config, format, pretty).await,

        Some(Commands::Credentials) => ultima::cli::credentials::execute(config, format, pretty, no_color),

        Some(Commands::Models) => ultima::cli::status::models(config, format, pretty).await,

        Some(Commands::Config(cmd)) => ultima::cli::config::execute(&cmd, &resolved, format, pretty),
    }
}
