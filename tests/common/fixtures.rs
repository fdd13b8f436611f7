#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Environment variables that could leak real credentials or config into a
/// test run of the binary.
pub const ISOLATED_ENV: &[&str] = &[
    "ULTIMA_CONFIG",
    "ULTIMA_PRIORITY",
    "ULTIMA_TIMEOUT",
    "ULTIMA_LOG",
    "ULTIMA_LOG_FORMAT",
    "ULTIMA_LOG_FILE",
    "RUST_LOG",
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
];

/// Config where every backend points somewhere that cannot succeed.
///
/// Ollama points at `ollama_url`; everything else lives under `dir`:
/// `dir/dolphin` (project root, run with `sh`) and `dir/.credentials.json`.
pub fn write_offline_config(dir: &Path, ollama_url: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        r#"[general]
timeout_seconds = 5
priority = ["claude", "openai", "gemini", "ollama"]
keys_file = "{keys}"

[ollama]
base_url = "{ollama_url}"

[dolphin]
path = "{dolphin}"
interpreter = "sh"

[gemini]
backend = "cli"
binary = "ultima-test-missing-gemini"

[claude]
credentials_path = "{creds}"
"#,
        keys = dir.join("keys.env").display(),
        dolphin = dir.join("dolphin").display(),
        creds = dir.join(".credentials.json").display(),
    );
    std::fs::write(&path, body).unwrap();
    path
}

/// Address nothing listens on.
pub const DEAD_URL: &str = "http://127.0.0.1:9";
