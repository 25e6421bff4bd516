//! Per-reference build outcomes and batch summaries.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pause_templates::TemplateReference;
use serde::{Deserialize, Serialize};

/// Outcome of building one template reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    /// The reference as given
    pub reference: TemplateReference,
    /// Final artifact path; empty when the build failed
    pub output_path: PathBuf,
    pub success: bool,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Template type, once the manifest was loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    /// Human-readable template name, once the manifest was loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    pub duration_ms: u64,
    /// Build directory kept after a failure, for inspection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
}

impl BuildResult {
    pub fn succeeded(reference: TemplateReference, output_path: PathBuf) -> Self {
        Self {
            reference,
            output_path,
            success: true,
            error: None,
            template_type: None,
            template_name: None,
            duration_ms: 0,
            build_dir: None,
        }
    }

    pub fn failed(reference: TemplateReference, error: impl Into<String>) -> Self {
        Self {
            reference,
            output_path: PathBuf::new(),
            success: false,
            error: Some(error.into()),
            template_type: None,
            template_name: None,
            duration_ms: 0,
            build_dir: None,
        }
    }

    /// Attach manifest details.
    pub fn with_template(mut self, name: impl Into<String>, template_type: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self.template_type = Some(template_type.into());
        self
    }

    pub fn with_build_dir(mut self, dir: PathBuf) -> Self {
        self.build_dir = Some(dir);
        self
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub results: Vec<BuildResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildSummary {
    pub fn new(results: Vec<BuildResult>, started_at: DateTime<Utc>) -> Self {
        Self {
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn successful(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Artifact paths of successful builds.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.successful().map(|r| r.output_path.clone()).collect()
    }

    pub fn success_count(&self) -> usize {
        self.successful().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// True when at least one reference was given and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.success_count() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as u64
    }
}
