//! Error rendering for ultima.
//!
//! Human mode prints a one-line header with the stable error code and an
//! optional hint. JSON mode emits a structured object for agents.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::UltimaError;

/// Render an error for stderr.
#[must_use]
pub fn render_error(error: &UltimaError, format: OutputFormat, pretty: bool, no_color: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Human => render_simple(error, no_color),
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &UltimaError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error, true))
}

fn render_simple(error: &UltimaError, no_color: bool) -> String {
    let header = format!("Error [{}]:", error.error_code());
    let header = if no_color {
        header
    } else {
        header.red().bold().to_string()
    };

    let mut lines = vec![format!("{header} {error}")];
    if let Some(hint) = error.suggestion() {
        lines.push(format!("Hint: {hint}"));
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct ErrorJson {
    error_code: &'static str,
    category: String,
    message: String,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &UltimaError) -> Self {
        Self {
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            exit_code: error.exit_code().into(),
            suggestion: error.suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_error_has_code_and_hint() {
        let err = UltimaError::UnknownProvider("mystery".to_string());
        let output = render_error(&err, OutputFormat::Human, false, true);
        assert!(output.starts_with("Error [ULT-C010]: unknown provider: mystery"));
        assert!(output.contains("Hint: Valid providers: auto, ollama"));
    }

    #[test]
    fn json_error_is_structured() {
        let err = UltimaError::ScriptNotFound("missing.mjs".to_string());
        let output = render_error(&err, OutputFormat::Json, false, true);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["error_code"], "ULT-E002");
        assert_eq!(json["exit_code"], 2);
        assert_eq!(json["category"], "Environment error");
        assert!(json.get("suggestion").is_none());
    }
}
