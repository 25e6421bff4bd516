//! Tool runner backed by real processes.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, Invocation, ToolRunner};

/// Runs invocations as child processes of the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Log each command line at debug level
    echo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self { echo: true }
    }

    /// Disable command echoing.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        if self.echo {
            debug!("Running: {}", invocation);
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.workdir {
            cmd.current_dir(dir);
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let output = cmd.output().await.map_err(|source| RunnerError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let result = ExecutionResult {
            program: invocation.program.clone(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if !result.success() {
            warn!("{} exited with code {}", invocation.program, exit_code);
        }

        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_in_workdir() {
        let temp = tempfile::tempdir().unwrap();
        let runner = SystemRunner::new();

        let inv = Invocation::new("sh")
            .args(["-c", "pwd && echo oops >&2 && exit 3"])
            .current_dir(temp.path());
        let result = runner.run(&inv).await.unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(result.stdout.trim().ends_with(
            temp.path().file_name().unwrap().to_str().unwrap()
        ));
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_env_is_scoped_to_invocation() {
        let runner = SystemRunner::new();
        let inv = Invocation::new("sh")
            .args(["-c", "printf %s \"$PAUSE_RUNNER_TEST\""])
            .env("PAUSE_RUNNER_TEST", "scoped");

        let result = runner.run(&inv).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "scoped");
        assert!(std::env::var("PAUSE_RUNNER_TEST").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&Invocation::new("pause-definitely-not-a-real-tool"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!runner.is_available("pause-definitely-not-a-real-tool").await);
    }
}
