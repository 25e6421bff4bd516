//! Tool runner trait and types.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// A single external program invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Working directory (inherits the current one when unset)
    pub workdir: Option<PathBuf>,
    /// Extra environment variables for this invocation only
    pub env: HashMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Whether `arg` appears among the arguments.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// The argument following `flag`, if any.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

// Environment values are left out so credentials never reach the logs.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of running an external program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Program that was run
    pub program: String,
    /// Exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Short diagnostic for error messages: exit code plus trimmed stderr
    /// (stdout when stderr is empty).
    pub fn failure_summary(&self) -> String {
        let output = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if output.is_empty() {
            format!("{} exited with code {}", self.program, self.exit_code)
        } else {
            format!(
                "{} exited with code {}: {}",
                self.program, self.exit_code, output
            )
        }
    }
}

/// Runs external programs on behalf of the pipeline.
///
/// Calls block the caller's pipeline until the program exits; there is no
/// timeout or cancellation.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion and capture its output.
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult>;

    /// Probe whether `program` can be started (`<program> --version`).
    async fn is_available(&self, program: &str) -> bool {
        self.run(&Invocation::new(program).arg("--version"))
            .await
            .map(|r| r.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("gomplate")
            .args(["--file", "resume.tex.tmpl"])
            .arg("--out")
            .path_arg(Path::new("/tmp/build/resume.tex"))
            .current_dir("/tmp/build")
            .env("GH_TOKEN", "secret");

        assert_eq!(inv.program, "gomplate");
        assert_eq!(inv.arg_after("--file"), Some("resume.tex.tmpl"));
        assert_eq!(inv.arg_after("--out"), Some("/tmp/build/resume.tex"));
        assert_eq!(inv.workdir, Some(PathBuf::from("/tmp/build")));
        assert!(inv.has_arg("--out"));
        assert_eq!(inv.arg_after("--missing"), None);
    }

    #[test]
    fn test_display_hides_env() {
        let inv = Invocation::new("sh")
            .args(["-c", "make pdf"])
            .env("GH_TOKEN", "secret");

        let shown = inv.to_string();
        assert_eq!(shown, "sh -c 'make pdf'");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_failure_summary_prefers_stderr() {
        let now = Utc::now();
        let result = ExecutionResult {
            program: "tectonic".into(),
            exit_code: 1,
            stdout: "some progress".into(),
            stderr: "error: undefined control sequence\n".into(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        };
        assert_eq!(
            result.failure_summary(),
            "tectonic exited with code 1: error: undefined control sequence"
        );
        assert!(!result.success());
    }
}
