//! Dolphin script runner.
//!
//! Runs `<interpreter> <root>/<scripts_dir>/<script> args...` with the
//! project root as working directory and returns stdout verbatim.
//!
//! Scripts that take structured input get it through a uniquely named JSON
//! file in the project root. The file is removed on every exit path.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::cli_runner::run_command;
use crate::core::models::{GenerationRequest, ProviderStatus};
use crate::core::probe::Probe;
use crate::core::provider::{Provider, ProviderKind};
use crate::error::{Result, UltimaError};
use crate::storage::DolphinConfig;

const NAME: &str = "dolphin";

/// Script run by [`DolphinProvider::agent_watch`].
pub const AGENT_SCRIPT: &str = "agent.mjs";
/// Script run by [`DolphinProvider::create_idea`].
pub const CREATE_IDEA_SCRIPT: &str = "create-idea.mjs";

/// Name, version and npm scripts from the project's `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

/// Adapter for a script-driven automation project.
#[derive(Debug)]
pub struct DolphinProvider {
    root: PathBuf,
    interpreter: String,
    scripts_dir: String,
    default_script: String,
    timeout: Duration,
    probe: Probe,
}

impl DolphinProvider {
    /// Build the adapter. Available iff the project root exists.
    pub async fn probe(config: &DolphinConfig, timeout: Duration) -> Self {
        let root = config.root();
        let probe = if !config.enabled {
            Probe::disabled(NAME)
        } else if tokio::fs::metadata(&root).await.is_ok_and(|m| m.is_dir()) {
            Probe::ready()
        } else {
            Probe::failed(NAME, format!("Dolphin not found at: {}", root.display()))
        };

        Self {
            root,
            interpreter: config.interpreter.clone(),
            scripts_dir: config.scripts_dir.clone(),
            default_script: config.default_script.clone(),
            timeout,
            probe,
        }
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn scripts_path(&self) -> PathBuf {
        self.root.join(&self.scripts_dir)
    }

    /// Run `name` from the scripts directory and return its stdout.
    ///
    /// # Errors
    ///
    /// - `ProviderUnavailable` when the project root was not found
    /// - `ScriptNotFound` when the script file is missing
    /// - `ProcessFailed` on a non-zero exit
    /// - `CliNotFound` / `Timeout` from the interpreter invocation
    pub async fn run_script<S: AsRef<str>>(&self, name: &str, args: &[S]) -> Result<String> {
        self.probe.require(NAME)?;

        let script = self.scripts_path().join(name);
        if !script.is_file() {
            return Err(UltimaError::ScriptNotFound(name.to_string()));
        }

        let mut argv: Vec<OsString> = Vec::with_capacity(args.len() + 1);
        argv.push(script.into_os_string());
        argv.extend(args.iter().map(|a| OsString::from(a.as_ref())));

        tracing::debug!(provider = NAME, script = name, args = args.len(), "Running script");
        run_command(&self.interpreter, argv.as_slice(), Some(&self.root), self.timeout)
            .await?
            .into_stdout(name)
    }

    /// Run the default script with `args`.
    ///
    /// # Errors
    ///
    /// See [`DolphinProvider::run_script`].
    pub async fn dolphin_command<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        self.run_script(&self.default_script, args).await
    }

    /// Run the agent in watch mode.
    ///
    /// # Errors
    ///
    /// See [`DolphinProvider::run_script`].
    pub async fn agent_watch(&self) -> Result<String> {
        self.run_script(AGENT_SCRIPT, &["watch"]).await
    }

    /// Serialize `payload` to a temporary JSON file in the project root and
    /// pass its path as the first positional argument.
    ///
    /// # Errors
    ///
    /// See [`DolphinProvider::run_script`]; also fails if the payload file
    /// cannot be written.
    pub async fn run_script_with_payload<T: Serialize + Sync>(
        &self,
        name: &str,
        payload: &T,
        extra_args: &[&str],
    ) -> Result<String> {
        self.probe.require(NAME)?;

        let mut file = tempfile::Builder::new()
            .prefix(".ultima-payload-")
            .suffix(".json")
            .tempfile_in(&self.root)?;
        serde_json::to_writer(&mut file, payload)?;
        file.flush()?;

        let mut args = vec![file.path().to_string_lossy().into_owned()];
        args.extend(extra_args.iter().map(|a| (*a).to_string()));

        // `file` drops after the script returns, deleting the payload.
        self.run_script(name, args.as_slice()).await
    }

    /// Hand an idea record to the idea-creation script.
    ///
    /// # Errors
    ///
    /// See [`DolphinProvider::run_script_with_payload`].
    pub async fn create_idea(&self, idea: &serde_json::Value) -> Result<String> {
        self.run_script_with_payload(CREATE_IDEA_SCRIPT, idea, &[]).await
    }

    /// Sorted `*.mjs` file names in the scripts directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list_scripts(&self) -> Result<Vec<String>> {
        self.probe.require(NAME)?;
        let mut scripts: Vec<String> = fs::read_dir(self.scripts_path())?
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".mjs"))
            .collect();
        scripts.sort();
        Ok(scripts)
    }

    /// Read `package.json` from the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid JSON.
    pub fn project_info(&self) -> Result<ProjectInfo> {
        self.probe.require(NAME)?;
        let content = fs::read_to_string(self.root.join("package.json"))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl Provider for DolphinProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Dolphin
    }

    fn is_available(&self) -> bool {
        self.probe.is_available()
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        self.dolphin_command(&[request.prompt.as_str()]).await
    }

    async fn status(&self) -> ProviderStatus {
        if !self.probe.is_available() {
            return ProviderStatus::unavailable(self.probe.reason().map(str::to_string));
        }
        ProviderStatus {
            available: true,
            path: Some(self.root.display().to_string()),
            version: self.project_info().ok().and_then(|info| info.version),
            ..ProviderStatus::default()
        }
    }
}
