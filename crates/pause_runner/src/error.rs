//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while launching external tools.
///
/// A tool that starts and exits non-zero is not an error at this level;
/// callers inspect [`crate::ExecutionResult::success`].
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Whether the program could not be found on the invocation path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Spawn { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
        }
    }
}
