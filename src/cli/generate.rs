//! Generate and chat commands.

use crate::cli::args::{ChatArgs, GenerateArgs, OutputFormat};
use crate::cli::emit;
use crate::core::facade::{DispatchOutcome, Ultima};
use crate::core::models::ChatMessage;
use crate::error::Result;
use crate::render;
use crate::storage::Config;

/// Execute the generate command.
pub async fn execute(args: &GenerateArgs, config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let ultima = Ultima::from_config(config).await;
    let outcome = ultima
        .try_generate(&args.prompt, &args.dispatch.selection(), &args.dispatch.options())
        .await;
    finish(outcome, format, pretty)
}

/// Execute the chat command.
pub async fn chat(args: &ChatArgs, config: &Config, format: OutputFormat, pretty: bool) -> Result<()> {
    let history = args
        .messages
        .iter()
        .map(|m| m.parse::<ChatMessage>())
        .collect::<Result<Vec<_>>>()?;

    let ultima = Ultima::from_config(config).await;
    let outcome = ultima
        .try_chat(&history, &args.dispatch.selection(), &args.dispatch.options())
        .await;
    finish(outcome, format, pretty)
}

/// Print the text (or the JSON record) and surface the failure, if any.
fn finish(outcome: DispatchOutcome, format: OutputFormat, pretty: bool) -> Result<()> {
    let output = render::render_outcome(&outcome, format, pretty)?;
    match outcome.result {
        Ok(_) => {
            emit(&output);
            Ok(())
        }
        Err(e) => {
            // JSON callers still get the attempt record on stdout.
            if format == OutputFormat::Json {
                emit(&output);
            }
            Err(e)
        }
    }
}
