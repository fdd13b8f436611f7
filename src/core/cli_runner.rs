//! CLI command runner utilities.
//!
//! Provides async subprocess execution for CLI- and script-backed adapters.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{Result, UltimaError};

/// Timeout for quick probes such as `--version`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Output from a CLI command.
#[derive(Debug)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliOutput {
    /// Check if command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout verbatim on success.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` with trimmed stderr on a non-zero exit.
    pub fn into_stdout(self, program: &str) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(UltimaError::ProcessFailed {
                program: program.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().chars().take(500).collect(),
            })
        }
    }
}

/// Check if a binary resolves on the search path.
#[must_use]
pub fn is_on_path(binary: &str) -> bool {
    which::which(binary).is_ok()
}

/// Run a CLI command with timeout, optionally in a working directory.
///
/// # Errors
///
/// Returns error if:
/// - Command not found
/// - Command times out
/// - Command fails to execute
pub async fn run_command<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    cwd: Option<&Path>,
    timeout_duration: Duration,
) -> Result<CliOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    tracing::debug!(program, ?cwd, "Spawning subprocess");

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            UltimaError::CliNotFound(program.to_string())
        } else {
            UltimaError::Io(e)
        }
    })?;

    let result = timeout(timeout_duration, async {
        // Read stdout and stderr concurrently so a full pipe on one stream
        // cannot block the child while we wait on the other.
        let stdout_handle = async {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let stderr_handle = async {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(stderr)
        };

        let (stdout_result, stderr_result) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout_result?;
        let stderr = stderr_result?;

        let status = child.wait().await?;

        Ok::<_, std::io::Error>(CliOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
        })
    })
    .await;

    match result {
        Ok(Ok(output)) => {
            tracing::debug!(program, exit_code = output.exit_code, "Subprocess finished");
            Ok(output)
        }
        Ok(Err(e)) => Err(UltimaError::Io(e)),
        Err(_) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            Err(UltimaError::Timeout(timeout_duration.as_secs()))
        }
    }
}
