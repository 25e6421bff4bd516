//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while resolving, loading or rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Built-in template \"{name}\" not found. Available templates: {available}")]
    TemplateNotFound { name: String, available: String },

    #[error("Failed to clone template {url}: {message}")]
    CloneFailure { url: String, message: String },

    #[error("No template manifest found in {dir}. Expected one of: {expected}")]
    ManifestNotFound { dir: PathBuf, expected: String },

    #[error("Template manifest is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid template type: {value}. Must be one of: {valid}")]
    InvalidType { value: String, valid: String },

    #[error("Unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Template rendering failed: {0}")]
    RenderFailure(String),

    #[error("IO error at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateError {
    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}
