//! API key resolution.
//!
//! Keys are resolved in order, first match wins:
//! 1. An explicit override (config file `api_key`)
//! 2. A named environment variable
//! 3. A plain-text keys file of `KEY=value` lines
//!
//! The keys file is dotenv format: blank lines, `#` comments, an optional
//! `export ` prefix, quoted values and trailing comments. It is never written.

use std::path::Path;

/// Resolve an API key from override, environment, then keys file.
#[must_use]
pub fn resolve_api_key(
    explicit: Option<&str>,
    env_var: &str,
    keys_file: Option<&Path>,
) -> Option<String> {
    resolve_from(explicit, std::env::var(env_var).ok(), env_var, keys_file)
}

/// Resolution with the environment lookup already performed.
#[must_use]
pub fn resolve_from(
    explicit: Option<&str>,
    env_value: Option<String>,
    key_name: &str,
    keys_file: Option<&Path>,
) -> Option<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        tracing::debug!(key_name, "API key from config override");
        return Some(key.to_string());
    }

    if let Some(key) = env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    {
        tracing::debug!(key_name, "API key from environment");
        return Some(key);
    }

    let path = keys_file?;
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(?path, "Keys file not readable: {e}");
            return None;
        }
    };
    let key = first_match(entries, key_name);
    if key.is_some() {
        tracing::debug!(key_name, ?path, "API key from keys file");
    }
    key
}

/// Find `key_name` in `KEY=value` content.
#[must_use]
pub fn lookup_key(content: &str, key_name: &str) -> Option<String> {
    first_match(dotenvy::from_read_iter(content.as_bytes()), key_name)
}

/// First non-empty value for `key_name`. Lines that fail to parse are skipped.
fn first_match(
    entries: impl Iterator<Item = dotenvy::Result<(String, String)>>,
    key_name: &str,
) -> Option<String> {
    entries
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::debug!("Skipping keys file line: {e}"))
                .ok()
        })
        .find_map(|(key, value)| {
            let value = value.trim();
            (key == key_name && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEYS: &str = r#"
# hosted api keys
OPENAI_API_KEY="sk-openai-quoted"
export GEMINI_API_KEY=gm-plain
ANTHROPIC_API_KEY='sk-ant-single'
ANTHROPIC_API_KEY=second-should-lose
EMPTY_KEY=
"#;

    #[test]
    fn lookup_handles_quotes_and_export() {
        assert_eq!(lookup_key(KEYS, "OPENAI_API_KEY").as_deref(), Some("sk-openai-quoted"));
        assert_eq!(lookup_key(KEYS, "GEMINI_API_KEY").as_deref(), Some("gm-plain"));
        assert_eq!(lookup_key(KEYS, "ANTHROPIC_API_KEY").as_deref(), Some("sk-ant-single"));
    }

    #[test]
    fn lookup_ignores_missing_and_empty() {
        assert_eq!(lookup_key(KEYS, "EMPTY_KEY"), None);
        assert_eq!(lookup_key(KEYS, "MISSING"), None);
        // Prefix of a key is not a match.
        assert_eq!(lookup_key("OPENAI_API_KEY_2=x", "OPENAI_API_KEY"), None);
    }

    #[test]
    fn quoted_value_drops_trailing_comment() {
        let content = "OPENAI_API_KEY=\"sk-real\" # prod key\nGEMINI_API_KEY=gm-plain # dev\n";
        assert_eq!(lookup_key(content, "OPENAI_API_KEY").as_deref(), Some("sk-real"));
        assert_eq!(lookup_key(content, "GEMINI_API_KEY").as_deref(), Some("gm-plain"));
    }

    #[test]
    fn keys_file_with_comment_resolves_clean_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# keys").unwrap();
        writeln!(file, "ANTHROPIC_API_KEY='sk-ant-file' # personal").unwrap();
        writeln!(file, "ANTHROPIC_API_KEY=sk-ant-later").unwrap();

        assert_eq!(
            resolve_from(None, None, "ANTHROPIC_API_KEY", Some(file.path())).as_deref(),
            Some("sk-ant-file")
        );
    }

    #[test]
    fn explicit_beats_env_beats_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "OPENAI_API_KEY=from-file").unwrap();
        let path = Some(file.path());

        assert_eq!(
            resolve_from(Some("from-config"), Some("from-env".into()), "OPENAI_API_KEY", path)
                .as_deref(),
            Some("from-config")
        );
        assert_eq!(
            resolve_from(None, Some("from-env".into()), "OPENAI_API_KEY", path).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            resolve_from(Some("  "), Some(String::new()), "OPENAI_API_KEY", path).as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn missing_keys_file_is_no_key() {
        assert_eq!(
            resolve_from(None, None, "OPENAI_API_KEY", Some(Path::new("/nonexistent/keys.env"))),
            None
        );
        assert_eq!(resolve_from(None, None, "OPENAI_API_KEY", None), None);
    }
}
