//! Mock tool runner for testing.
//!
//! Provides a configurable implementation of the [`ToolRunner`] trait so the
//! pipeline can be tested without gomplate, tectonic, typst or gh installed.
//! Per-program handlers can write the files a real tool would produce.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, Invocation, ToolRunner};

/// Predefined mock response for an invocation.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 10,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 10,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Callback producing the response for one program's invocations.
pub type MockHandler = Arc<dyn Fn(&Invocation) -> MockResponse + Send + Sync>;

/// Mock tool runner.
///
/// Response selection, in order: a spawn failure for programs marked
/// missing, the program's handler, the next queued response, success.
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Per-program handlers.
    handlers: Arc<RwLock<HashMap<String, MockHandler>>>,
    /// Queued responses for programs without a handler.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next queued response.
    response_index: Arc<AtomicUsize>,
    /// Programs that fail to start.
    missing: Arc<RwLock<Vec<String>>>,
    /// Captured invocations for verification.
    captured_calls: Arc<RwLock<Vec<Invocation>>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for the next unhandled invocation.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Handle every invocation of `program` with `handler`.
    pub fn on<F>(self, program: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Invocation) -> MockResponse + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .insert(program.into(), Arc::new(handler));
        self
    }

    /// Make `program` fail to start, as if it were not installed.
    pub fn missing_program(self, program: impl Into<String>) -> Self {
        self.missing.write().push(program.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<Invocation> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific program was invoked.
    pub fn was_called(&self, program: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.program == program)
    }

    /// Get invocations of a specific program.
    pub fn get_program_calls(&self, program: &str) -> Vec<Invocation> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl ToolRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(invocation.clone());

        if self.missing.read().contains(&invocation.program) {
            return Err(RunnerError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let handler = self.handlers.read().get(&invocation.program).cloned();
        let response = match handler {
            Some(handler) => handler(invocation),
            None => self.next_response(),
        };

        let now = Utc::now();
        Ok(ExecutionResult {
            program: invocation.program.clone(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: response.duration_ms,
        })
    }
}
