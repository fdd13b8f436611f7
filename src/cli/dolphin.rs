//! Dolphin project commands: scripts, ideas, and the agent.

use serde::Serialize;

use crate::cli::args::{OutputFormat, ScriptArgs};
use crate::cli::emit;
use crate::error::{Result, UltimaError};
use crate::providers::DolphinProvider;
use crate::render::{self, robot};
use crate::storage::Config;

#[derive(Debug, Serialize)]
struct ScriptOutput<'a> {
    script: &'a str,
    stdout: &'a str,
}

async fn open(config: &Config) -> DolphinProvider {
    DolphinProvider::probe(&config.dolphin, config.general.timeout()).await
}

fn parse_json(raw: &str, what: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| UltimaError::Config(format!("invalid {what} JSON: {e}")))
}

fn show(script: &str, stdout: &str, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        // Script output is passed through untouched.
        OutputFormat::Human => print!("{stdout}"),
        OutputFormat::Json => emit(&robot::render(&ScriptOutput { script, stdout }, pretty)?),
    }
    Ok(())
}

/// Execute the script command.
pub async fn run_script(args: &ScriptArgs, config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let dolphin = open(config).await;
    let stdout = if let Some(raw) = &args.payload {
        let payload = parse_json(raw, "--payload")?;
        let extra: Vec<&str> = args.args.iter().map(String::as_str).collect();
        dolphin
            .run_script_with_payload(&args.name, &payload, &extra)
            .await?
    } else {
        dolphin.run_script(&args.name, args.args.as_slice()).await?
    };
    show(&args.name, &stdout, format, pretty)
}

/// List the `.mjs` scripts in the project.
pub async fn list(config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let dolphin = open(config).await;
    let scripts = dolphin.list_scripts()?;
    let title = match dolphin.project_info() {
        Ok(info) => format!(
            "{} {} scripts",
            info.name.as_deref().unwrap_or("dolphin"),
            info.version.as_deref().unwrap_or("(unversioned)")
        ),
        Err(_) => format!("Scripts in {}", dolphin.scripts_path().display()),
    };
    emit(&render::render_list(&title, &scripts, format, pretty)?);
    Ok(())
}

/// Hand an idea record to the idea-creation script.
pub async fn idea(raw: &str, config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let idea = parse_json(raw, "idea")?;
    let dolphin = open(config).await;
    let stdout = dolphin.create_idea(&idea).await?;
    show(crate::providers::dolphin::CREATE_IDEA_SCRIPT, &stdout, format, pretty)
}

/// Run the agent script in watch mode.
pub async fn agent(config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let dolphin = open(config).await;
    let stdout = dolphin.agent_watch().await?;
    show(crate::providers::dolphin::AGENT_SCRIPT, &stdout, format, pretty)
}
