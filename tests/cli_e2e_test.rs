//! End-to-end tests for the `ultima` binary.
//!
//! Every run gets an isolated HOME, a config file under a temp dir, and no
//! API keys from the parent environment.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ultima::{make_script_project, now_ms, write_credentials_file};

mod common;
use common::fixtures::{DEAD_URL, ISOLATED_ENV, write_offline_config};

#[allow(deprecated)]
fn ultima(home: &Path, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ultima").unwrap();
    for key in ISOLATED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env("ULTIMA_CONFIG", config);
    cmd
}

fn offline() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = write_offline_config(dir.path(), DEAD_URL);
    (dir, config)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_lists_commands() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate").and(predicate::str::contains("status")));
}

#[test]
fn status_json_works_with_every_backend_missing() {
    let (dir, config) = offline();
    let output = ultima(dir.path(), &config)
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["system"], "ULTIMA_SYSTEM");
    assert_eq!(json["priority"][0], "claude");
    for name in ["claude", "openai", "gemini", "dolphin"] {
        assert_eq!(json["providers"][name]["available"], false, "{name}");
    }
    // Ollama only needs a parseable URL to count as available.
    assert_eq!(json["providers"]["ollama"]["available"], true);
}

#[test]
fn status_is_the_default_command() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ULTIMA_SYSTEM - Integration Status")
                .and(predicate::str::contains("[Gemini]     [FAIL]")),
        );
}

#[test]
fn unknown_provider_exits_non_zero() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .args(["generate", "hello", "--provider", "foo"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown provider"));
}

#[test]
fn auto_with_nothing_reachable_exits_one() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .args(["generate", "hello"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no provider available"));
}

#[test]
fn generate_json_failure_still_reports_attempts() {
    let (dir, config) = offline();
    let output = ultima(dir.path(), &config)
        .args(["--json", "generate", "hello"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json = stdout_json(&output);
    assert_eq!(json["text"], serde_json::Value::Null);
    assert_eq!(json["error_code"], "ULT-P002");
    assert_eq!(json["attempts"][0]["provider"], "ollama");
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_through_named_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "hello back\n" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_offline_config(dir.path(), &server.uri());
    ultima(dir.path(), &config)
        .args(["generate", "hello", "--provider", "ollama"])
        .assert()
        .success()
        .stdout("hello back\n");
}

#[test]
fn malformed_chat_message_is_a_config_error() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .args(["chat", "no-role-here"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("role:content"));
}

#[test]
fn invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[general\ntimeout_seconds = ").unwrap();

    ultima(dir.path(), &config)
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ULT-C001"));
}

#[test]
fn priority_env_override_is_validated() {
    let (dir, config) = offline();
    ultima(dir.path(), &config)
        .env("ULTIMA_PRIORITY", "ollama,skynet")
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("skynet"));
}

#[test]
fn script_runs_through_configured_interpreter() {
    let (dir, config) = offline();
    make_script_project(
        &dir.path().join("dolphin"),
        &[("greet.mjs", "echo \"hi $1 $2\"\n")],
    );

    ultima(dir.path(), &config)
        .args(["script", "greet.mjs", "there", "--loud"])
        .assert()
        .success()
        .stdout("hi there --loud\n");
}

#[test]
fn missing_script_exits_two() {
    let (dir, config) = offline();
    make_script_project(&dir.path().join("dolphin"), &[]);

    ultima(dir.path(), &config)
        .args(["script", "ghost.mjs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("script not found: ghost.mjs"));
}

#[test]
fn scripts_lists_project_scripts_as_json() {
    let (dir, config) = offline();
    make_script_project(
        &dir.path().join("dolphin"),
        &[("b.mjs", ""), ("a.mjs", ""), ("README.md", "")],
    );

    let output = ultima(dir.path(), &config)
        .args(["scripts", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!(["a.mjs", "b.mjs"]));
}

#[test]
fn credentials_view_masks_tokens() {
    let (dir, config) = offline();
    write_credentials_file(dir.path(), now_ms() + 3_600_000);

    let output = ultima(dir.path(), &config)
        .args(["credentials", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["found"], true);
    assert_eq!(json["token_valid"], true);
    assert_eq!(json["subscription_type"], "max");
    assert_eq!(json["access_token_prefix"], "sk-ant-oat01-test-ac...");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("0123456789"));
}

#[test]
fn config_init_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.toml");

    ultima(dir.path(), &config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(config.exists());

    ultima(dir.path(), &config)
        .args(["config", "init"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_show_reports_source() {
    let (dir, config) = offline();
    let output = ultima(dir.path(), &config)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["path"], config.display().to_string());
    assert_eq!(json["path_source"], "environment variable");
    assert_eq!(json["exists"], true);
    assert_eq!(json["config"]["general"]["timeout_seconds"], 5);
}
