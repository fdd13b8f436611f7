//! Robot-mode output (JSON).
//!
//! Provides stable output for scripts and AI agents.

use serde::Serialize;

use crate::core::facade::{DispatchAttempt, DispatchOutcome};
use crate::error::Result;

/// Render any serializable value as compact or pretty JSON.
pub fn render<T: Serialize + ?Sized>(output: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(output)?)
    } else {
        Ok(serde_json::to_string(output)?)
    }
}

/// JSON view of a dispatch outcome.
#[derive(Debug, Serialize)]
pub struct OutcomeOutput<'a> {
    pub provider: Option<&'a str>,
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    pub attempts: &'a [DispatchAttempt],
}

impl<'a> From<&'a DispatchOutcome> for OutcomeOutput<'a> {
    fn from(outcome: &'a DispatchOutcome) -> Self {
        let (text, error, error_code) = match &outcome.result {
            Ok(text) => (Some(text.as_str()), None, None),
            Err(e) => (None, Some(e.to_string()), Some(e.error_code())),
        };
        Self {
            provider: outcome.provider.as_deref(),
            text,
            error,
            error_code,
            attempts: &outcome.attempts,
        }
    }
}
