//! Human-readable output.
//!
//! Status uses a banner with one `[OK]`/`[FAIL]` line per provider followed
//! by indented details. Colors come from `colored` and are skipped entirely
//! when `no_color` is set.

use colored::Colorize;

use super::CredentialsSummary;
use crate::core::facade::DispatchOutcome;
use crate::core::models::{ProviderStatus, StatusReport};
use crate::core::provider::ProviderKind;

const RULE_WIDTH: usize = 60;

/// Models listed per provider before eliding.
const MODELS_SHOWN: usize = 3;

fn ok_tag(no_color: bool) -> String {
    if no_color {
        "[OK]".to_string()
    } else {
        "[OK]".green().bold().to_string()
    }
}

fn fail_tag(no_color: bool) -> String {
    if no_color {
        "[FAIL]".to_string()
    } else {
        "[FAIL]".red().bold().to_string()
    }
}

fn heading(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.cyan().bold().to_string()
    }
}

fn label_for(name: &str) -> String {
    ProviderKind::from_cli_name(name)
        .map_or_else(|_| name.to_string(), |kind| kind.display_name().to_string())
}

/// Provider names in canonical order, then any others alphabetically.
fn ordered_names(report: &StatusReport) -> Vec<&str> {
    let mut names: Vec<&str> = ProviderKind::ALL
        .iter()
        .map(|k| k.cli_name())
        .filter(|name| report.providers.contains_key(*name))
        .collect();
    names.extend(
        report
            .providers
            .keys()
            .map(String::as_str)
            .filter(|name| ProviderKind::from_cli_name(name).is_err()),
    );
    names
}

fn detail_lines(status: &ProviderStatus) -> Vec<String> {
    let mut lines = Vec::new();
    if !status.available {
        if let Some(reason) = &status.reason {
            lines.push(format!("Reason: {reason}"));
        }
        return lines;
    }

    if !status.models.is_empty() {
        let shown: Vec<&str> = status
            .models
            .iter()
            .take(MODELS_SHOWN)
            .map(String::as_str)
            .collect();
        let more = if status.models.len() > MODELS_SHOWN { " ..." } else { "" };
        lines.push(format!("Models: {}{more}", shown.join(", ")));
    }
    if let Some(model) = &status.model {
        lines.push(format!("Default model: {model}"));
    }
    if let Some(path) = &status.path {
        lines.push(format!("Path: {path}"));
    }
    if let Some(version) = &status.version {
        lines.push(format!("Version: {version}"));
    }
    if let Some(auth) = &status.auth {
        lines.push(format!("Auth: {auth}"));
    }
    if let Some(subscription) = &status.subscription {
        lines.push(format!("Subscription: {subscription}"));
    }
    if let Some(valid) = status.token_valid {
        lines.push(format!("Token: {}", if valid { "[VALID]" } else { "[EXPIRED]" }));
    }
    lines
}

/// Render the status banner.
#[must_use]
pub fn render_status(report: &StatusReport, no_color: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut output = String::new();

    output.push_str(&format!("{rule}\n"));
    output.push_str(&format!(
        "{}\n",
        heading(&format!("{} - Integration Status", report.system), no_color)
    ));
    output.push_str(&format!("{rule}\n"));

    for name in ordered_names(report) {
        let status = &report.providers[name];
        let label = format!("[{}]", label_for(name));
        let tag = if status.available {
            ok_tag(no_color)
        } else {
            fail_tag(no_color)
        };
        output.push_str(&format!("{label:<13}{tag}\n"));
        for line in detail_lines(status) {
            output.push_str(&format!("   {line}\n"));
        }
    }

    output.push_str(&format!("{rule}\n"));
    output.push_str(&format!("Priority: {}\n", report.priority.join(" > ")));
    output.push_str(&format!(
        "Available: {}/{}\n",
        report.available_count(),
        report.providers.len()
    ));
    output
}

/// Render the generated text, or nothing when there is none.
#[must_use]
pub fn render_outcome(outcome: &DispatchOutcome) -> String {
    match &outcome.result {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => String::new(),
    }
}

/// Render the stored-credentials view.
#[must_use]
pub fn render_credentials(summary: &CredentialsSummary, no_color: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut output = String::new();
    output.push_str(&format!("{rule}\n"));
    output.push_str(&format!("{}\n", heading("Claude Credentials", no_color)));
    output.push_str(&format!("{rule}\n"));

    if !summary.found {
        output.push_str(&format!(
            "{} Credentials not found at: {}\n",
            fail_tag(no_color),
            summary.path
        ));
        return output;
    }

    output.push_str(&format!("{} Loaded from: {}\n", ok_tag(no_color), summary.path));

    if let (Some(prefix), Some(len)) = (&summary.access_token_prefix, summary.access_token_length) {
        output.push_str(&format!("\nAccess token:  {prefix} ({len} characters)\n"));
    } else {
        output.push_str(&format!("\n{} No access token\n", fail_tag(no_color)));
    }
    if let (Some(prefix), Some(len)) = (&summary.refresh_token_prefix, summary.refresh_token_length) {
        output.push_str(&format!("Refresh token: {prefix} ({len} characters)\n"));
    }

    if let Some(expires_at) = summary.expires_at {
        output.push_str(&format!(
            "Expires:       {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(remaining) = &summary.time_remaining {
            output.push_str(&format!(" ({remaining})"));
        }
        output.push('\n');
    }
    let validity = if summary.token_valid {
        ok_tag(no_color).replace("OK", "VALID")
    } else {
        fail_tag(no_color).replace("FAIL", "EXPIRED")
    };
    output.push_str(&format!("Token:         {validity}\n"));

    output.push_str(&format!(
        "Subscription:  {}\n",
        summary.subscription_type.as_deref().unwrap_or("unknown")
    ));
    output.push_str(&format!(
        "Rate limit:    {}\n",
        summary.rate_limit_tier.as_deref().unwrap_or("unknown")
    ));
    output.push_str(&format!("Scopes ({}):\n", summary.scopes.len()));
    for scope in &summary.scopes {
        output.push_str(&format!("  - {scope}\n"));
    }
    output
}

/// Render a titled list, one item per line.
#[must_use]
pub fn render_list(title: &str, items: &[String]) -> String {
    let mut output = format!("{title} ({}):\n", items.len());
    for item in items {
        output.push_str(&format!("  {item}\n"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn report() -> StatusReport {
        let mut providers = BTreeMap::new();
        providers.insert(
            "ollama".to_string(),
            ProviderStatus {
                available: true,
                models: vec![
                    "llama2".to_string(),
                    "mistral".to_string(),
                    "phi3".to_string(),
                    "qwen2".to_string(),
                ],
                ..ProviderStatus::default()
            },
        );
        providers.insert(
            "gemini".to_string(),
            ProviderStatus::unavailable(Some("gemini not available in PATH".to_string())),
        );
        providers.insert(
            "claude".to_string(),
            ProviderStatus {
                available: true,
                subscription: Some("max".to_string()),
                token_valid: Some(false),
                ..ProviderStatus::default()
            },
        );
        StatusReport {
            system: "ULTIMA_SYSTEM".to_string(),
            version: "0.1.0".to_string(),
            timestamp: Utc::now(),
            priority: vec!["claude".to_string(), "gemini".to_string(), "ollama".to_string()],
            providers,
        }
    }

    #[test]
    fn status_banner_lists_providers_in_canonical_order() {
        let output = render_status(&report(), true);
        let ollama = output.find("[Ollama]").unwrap();
        let gemini = output.find("[Gemini]").unwrap();
        let claude = output.find("[Claude AI]").unwrap();
        assert!(ollama < gemini && gemini < claude);

        assert!(output.contains("[Ollama]     [OK]"));
        assert!(output.contains("[Gemini]     [FAIL]"));
        assert!(output.contains("Models: llama2, mistral, phi3 ..."));
        assert!(output.contains("Reason: gemini not available in PATH"));
        assert!(output.contains("Token: [EXPIRED]"));
        assert!(output.contains("Priority: claude > gemini > ollama"));
        assert!(output.contains("Available: 2/3"));
    }

    #[test]
    fn no_color_output_has_no_escape_codes() {
        assert!(!render_status(&report(), true).contains('\u{1b}'));
    }

    #[test]
    fn list_counts_items() {
        let items = vec!["a.mjs".to_string(), "b.mjs".to_string()];
        assert_eq!(render_list("Scripts", &items), "Scripts (2):\n  a.mjs\n  b.mjs\n");
    }
}
