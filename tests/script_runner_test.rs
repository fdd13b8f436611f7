//! Dolphin script runner against a throwaway project.
//!
//! Scripts are plain shell files run through `sh` so the tests don't need
//! a JavaScript runtime.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_json::json;

use ultima::core::models::GenerationRequest;
use ultima::core::provider::Provider;
use ultima::providers::DolphinProvider;
use ultima::storage::DolphinConfig;
use ultima::{UltimaError, make_script_project};

mod common;
use common::log_capture::TestLogCapture;

const TIMEOUT: Duration = Duration::from_secs(10);

async fn dolphin(root: &Path) -> DolphinProvider {
    let config = DolphinConfig {
        path: Some(root.to_path_buf()),
        interpreter: "sh".to_string(),
        ..DolphinConfig::default()
    };
    DolphinProvider::probe(&config, TIMEOUT).await
}

fn leftover_payloads(root: &Path) -> Vec<String> {
    fs::read_dir(root)
        .unwrap()
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(".ultima-payload-"))
        .collect()
}

#[tokio::test]
async fn runs_script_with_args_in_project_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(
        dir.path(),
        &[("echo.mjs", "echo \"args: $*\"\nbasename \"$(pwd)\"\n")],
    );

    let out = dolphin(&root)
        .await
        .run_script("echo.mjs", &["one", "two"])
        .await
        .unwrap();

    let expected_dir = root.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(out, format!("args: one two\n{expected_dir}\n"));
}

#[tokio::test]
async fn missing_script_is_script_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(dir.path(), &[]);

    let err = dolphin(&root)
        .await
        .run_script("missing.mjs", &[] as &[&str])
        .await
        .unwrap_err();
    assert!(matches!(err, UltimaError::ScriptNotFound(ref name) if name == "missing.mjs"));
}

#[tokio::test]
async fn non_zero_exit_is_absent_at_the_boundary() {
    let capture = TestLogCapture::start();
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(
        dir.path(),
        &[("dolphin.mjs", "echo partial\necho 'boom' >&2\nexit 3\n")],
    );
    let adapter = dolphin(&root).await;

    let err = adapter.run_script("dolphin.mjs", &["x"]).await.unwrap_err();
    assert!(matches!(err, UltimaError::ProcessFailed { exit_code: 3, .. }));

    assert_eq!(adapter.generate(&GenerationRequest::new("x")).await, None);
    capture.assert_field_logged("error_code", "ULT-E010");
}

#[tokio::test]
async fn generate_runs_default_script_with_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(dir.path(), &[("dolphin.mjs", "printf '%s' \"$1\"\n")]);

    let text = dolphin(&root)
        .await
        .generate(&GenerationRequest::new("write a haiku"))
        .await;
    assert_eq!(text.as_deref(), Some("write a haiku"));
}

#[tokio::test]
async fn payload_file_is_removed_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(
        dir.path(),
        &[("create-idea.mjs", "cat \"$1\"\n")],
    );

    let idea = json!({ "title": "Solar kites", "tags": ["energy"] });
    let out = dolphin(&root).await.create_idea(&idea).await.unwrap();

    let echoed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(echoed, idea);
    assert!(leftover_payloads(&root).is_empty());
}

#[tokio::test]
async fn payload_file_is_removed_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(
        dir.path(),
        &[("import.mjs", "test -f \"$1\" || exit 9\necho \"$2\"\nexit 1\n")],
    );

    let err = dolphin(&root)
        .await
        .run_script_with_payload("import.mjs", &json!({ "rows": 3 }), &["--dry-run"])
        .await
        .unwrap_err();

    // Exit 1 (not 9) proves the payload existed while the script ran.
    assert!(matches!(err, UltimaError::ProcessFailed { exit_code: 1, .. }));
    assert!(leftover_payloads(&root).is_empty());
}

#[tokio::test]
async fn payload_for_missing_script_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(dir.path(), &[]);

    let err = dolphin(&root)
        .await
        .run_script_with_payload("nope.mjs", &json!({}), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, UltimaError::ScriptNotFound(_)));
    assert!(leftover_payloads(&root).is_empty());
}

#[tokio::test]
async fn lists_only_mjs_scripts_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let root = make_script_project(
        dir.path(),
        &[("zeta.mjs", ""), ("alpha.mjs", ""), ("notes.txt", "")],
    );
    fs::write(
        root.join("package.json"),
        r#"{ "name": "dolphin", "version": "2.1.0", "scripts": { "start": "node scripts/agent.mjs" } }"#,
    )
    .unwrap();

    let adapter = dolphin(&root).await;
    assert_eq!(adapter.list_scripts().unwrap(), ["alpha.mjs", "zeta.mjs"]);

    let info = adapter.project_info().unwrap();
    assert_eq!(info.version.as_deref(), Some("2.1.0"));
    assert_eq!(info.scripts["start"], "node scripts/agent.mjs");
}

#[tokio::test]
async fn missing_project_root_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = dolphin(&dir.path().join("absent")).await;

    assert!(!adapter.is_available());
    assert_eq!(adapter.generate(&GenerationRequest::new("hi")).await, None);
    let status = adapter.status().await;
    assert!(!status.available);
    assert!(status.reason.is_some());
}
