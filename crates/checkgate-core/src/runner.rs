//! Check tool invocation.
//!
//! [`CheckRunner`] is the seam between orchestration and the external
//! validation tool. The production implementation shells out to the
//! configured executable; tests swap in the fakes from
//! [`crate::fakes`].

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;
use crate::outcome::{CheckOutcome, CheckScope, Diagnostics};

/// Default tool timeout in seconds (30 minutes).
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 1_800;

/// Interface to the external validation tool.
///
/// Both operations resolve to a terminal outcome or a [`ToolError`];
/// there is no partial result.
#[async_trait]
pub trait CheckRunner: Send + Sync {
    /// Validate every file under the tool's own configured scope.
    async fn run_all(&self) -> Result<CheckOutcome, ToolError>;

    /// Validate exactly the given paths, in order. `files` must be
    /// non-empty.
    async fn run_scoped(&self, files: &[PathBuf]) -> Result<CheckOutcome, ToolError>;
}

/// Configuration for the subprocess-backed check runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckToolConfig {
    /// Executable to invoke.
    pub program: String,

    /// Arguments preceding the scope flag.
    pub base_args: Vec<String>,

    /// Flag selecting a full pass.
    pub all_files_flag: String,

    /// Flag introducing an explicit path list.
    pub files_flag: String,

    /// Working directory for the tool.
    pub work_dir: PathBuf,

    /// Timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,

    /// Cap on captured diagnostics, in bytes.
    pub max_diagnostics_bytes: usize,
}

impl Default for CheckToolConfig {
    fn default() -> Self {
        Self {
            program: "pre-commit".to_string(),
            base_args: vec![
                "run".to_string(),
                "--show-diff-on-failure".to_string(),
                "--color=always".to_string(),
            ],
            all_files_flag: "--all-files".to_string(),
            files_flag: "--files".to_string(),
            work_dir: PathBuf::from("."),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            max_diagnostics_bytes: Diagnostics::MAX_BYTES,
        }
    }
}

/// Runs the configured tool as a subprocess, capturing output.
pub struct CommandCheckRunner {
    config: CheckToolConfig,
}

impl CommandCheckRunner {
    pub fn new(config: CheckToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckToolConfig {
        &self.config
    }

    async fn invoke(
        &self,
        scope: CheckScope,
        scope_args: Vec<OsString>,
    ) -> Result<CheckOutcome, ToolError> {
        let start = Instant::now();
        let program = self.config.program.clone();

        // kill_on_drop reaps the tool if this future is abandoned
        // mid-flight (timeout or external cancellation).
        let child = Command::new(&self.config.program)
            .args(&self.config.base_args)
            .args(&scope_args)
            .current_dir(&self.config.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Io {
                program: program.clone(),
                source,
            })?;

        let output = if self.config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ToolError::Timeout {
                program: program.clone(),
                timeout_secs: self.config.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        }
        .map_err(|source| ToolError::Io {
            program: program.clone(),
            source,
        })?;

        if output.status.code().is_none() {
            return Err(ToolError::Terminated { program });
        }

        let passed = output.status.success();
        let mut raw = output.stdout;
        raw.extend_from_slice(&output.stderr);
        let diagnostics = Diagnostics::capture(&raw, self.config.max_diagnostics_bytes);

        debug!(
            program = %program,
            scope = %scope,
            passed = passed,
            duration_ms = start.elapsed().as_millis() as u64,
            "check tool finished"
        );

        Ok(CheckOutcome {
            scope,
            passed,
            diagnostics,
        })
    }
}

#[async_trait]
impl CheckRunner for CommandCheckRunner {
    async fn run_all(&self) -> Result<CheckOutcome, ToolError> {
        let scope_args = vec![OsString::from(&self.config.all_files_flag)];
        self.invoke(CheckScope::All, scope_args).await
    }

    async fn run_scoped(&self, files: &[PathBuf]) -> Result<CheckOutcome, ToolError> {
        if files.is_empty() {
            return Err(ToolError::EmptyFileList);
        }
        let mut scope_args = Vec::with_capacity(files.len() + 1);
        scope_args.push(OsString::from(&self.config.files_flag));
        scope_args.extend(files.iter().map(|path| path.as_os_str().to_os_string()));
        self.invoke(CheckScope::Scoped, scope_args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_config() -> CheckToolConfig {
        CheckToolConfig {
            program: "echo".to_string(),
            base_args: vec!["checking".to_string()],
            timeout_secs: 60,
            ..CheckToolConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_all_passes_and_captures_output() {
        let runner = CommandCheckRunner::new(echo_config());
        let outcome = runner.run_all().await.expect("run all");
        assert_eq!(outcome.scope, CheckScope::All);
        assert!(outcome.passed);
        assert!(outcome.diagnostics.text().contains("checking"));
        assert!(outcome.diagnostics.text().contains("--all-files"));
    }

    #[tokio::test]
    async fn test_run_scoped_forwards_the_exact_paths() {
        let runner = CommandCheckRunner::new(echo_config());
        let files = [PathBuf::from("src/a.py"), PathBuf::from("docs/b.md")];
        let outcome = runner.run_scoped(&files).await.expect("run scoped");
        assert_eq!(outcome.scope, CheckScope::Scoped);
        assert!(outcome.passed);
        let text = outcome.diagnostics.text();
        assert!(text.contains("--files src/a.py docs/b.md"));
    }

    #[tokio::test]
    async fn test_run_scoped_rejects_an_empty_list() {
        let runner = CommandCheckRunner::new(echo_config());
        let result = runner.run_scoped(&[]).await;
        assert!(matches!(result, Err(ToolError::EmptyFileList)));
    }

    #[tokio::test]
    async fn test_failing_tool_yields_a_failed_outcome() {
        let config = CheckToolConfig {
            program: "false".to_string(),
            base_args: vec![],
            ..CheckToolConfig::default()
        };
        let runner = CommandCheckRunner::new(config);
        let outcome = runner.run_all().await.expect("run all");
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn test_missing_tool_is_an_invocation_error() {
        let config = CheckToolConfig {
            program: "definitely-not-a-real-tool-xyz".to_string(),
            ..CheckToolConfig::default()
        };
        let runner = CommandCheckRunner::new(config);
        let result = runner.run_all().await;
        assert!(matches!(result, Err(ToolError::Io { .. })));
    }

    #[tokio::test]
    async fn test_timeout_is_an_invocation_error() {
        let config = CheckToolConfig {
            program: "sleep".to_string(),
            base_args: vec![],
            all_files_flag: "5".to_string(),
            timeout_secs: 1,
            ..CheckToolConfig::default()
        };
        let runner = CommandCheckRunner::new(config);
        let result = runner.run_all().await;
        assert!(matches!(
            result,
            Err(ToolError::Timeout { timeout_secs: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_signal_killed_tool_is_terminated() {
        let config = CheckToolConfig {
            program: "sh".to_string(),
            base_args: vec!["-c".to_string(), "kill -9 $$".to_string()],
            ..CheckToolConfig::default()
        };
        let runner = CommandCheckRunner::new(config);
        let result = runner.run_all().await;
        assert!(matches!(
            result,
            Err(ToolError::Terminated { ref program }) if program == "sh"
        ));
    }

    #[tokio::test]
    async fn test_diagnostics_respect_the_configured_cap() {
        let config = CheckToolConfig {
            program: "echo".to_string(),
            base_args: vec!["x".repeat(256)],
            max_diagnostics_bytes: 32,
            ..CheckToolConfig::default()
        };
        let runner = CommandCheckRunner::new(config);
        let outcome = runner.run_all().await.expect("run all");
        assert!(outcome.diagnostics.is_truncated());
        assert!(outcome.diagnostics.total_bytes() > 32);
    }
}
