//! Error types for the build pipeline.

use std::path::PathBuf;

use pause_templates::TemplateError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised by a single reference's pipeline run.
///
/// The [`crate::Pipeline`] turns these into failed
/// [`crate::BuildResult`]s; they never escape a batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Compilation failed: {0}")]
    CompileFailure(String),

    #[error("Unsupported template type: {0}")]
    UnsupportedType(String),

    #[error("Failed to move {from} to {to}: {message}")]
    RelocationFailure {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
