//! Pipeline orchestration.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use pause_runner::ToolRunner;
use pause_templates::{
    load_manifest, prepare_data, TemplateManifest, TemplateReference, TemplateRenderer,
    TemplateResolver,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::compiler::CompilerDispatcher;
use crate::config::BuildConfig;
use crate::error::PipelineResult;
use crate::result::{BuildResult, BuildSummary};

/// Builds batches of template references.
pub struct Pipeline {
    config: BuildConfig,
    runner: Arc<dyn ToolRunner>,
    resolver: TemplateResolver,
    renderer: TemplateRenderer,
    dispatcher: CompilerDispatcher,
}

impl Pipeline {
    pub fn new(config: BuildConfig, runner: Arc<dyn ToolRunner>) -> Self {
        let resolver = TemplateResolver::new(&config.builtin_root, &config.work_dir, runner.clone())
            .with_program(&config.tools.gh);
        let renderer = TemplateRenderer::new(&config.work_dir, runner.clone())
            .with_program(&config.tools.gomplate);
        let dispatcher =
            CompilerDispatcher::new(&config.output_dir, config.tools.clone(), runner.clone());

        Self {
            config,
            runner,
            resolver,
            renderer,
            dispatcher,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Configured tools that do not answer `--version`.
    pub async fn missing_tools(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for tool in self.config.tools.all() {
            if !self.runner.is_available(tool).await {
                missing.push(tool.to_string());
            }
        }
        missing
    }

    /// Build every reference; results come back in input order.
    ///
    /// A failing reference produces a failed [`BuildResult`] and the batch
    /// carries on with the next one.
    pub async fn run(
        &self,
        references: &[TemplateReference],
        data: &Value,
        credential: Option<&str>,
    ) -> BuildSummary {
        let started_at = Utc::now();
        let total = references.len();
        info!(
            "Building {} template(s) with parallelism {}",
            total, self.config.max_parallel
        );

        let results: Vec<BuildResult> = stream::iter(references.iter().enumerate())
            .map(|(index, reference)| self.run_one(index + 1, total, reference, data, credential))
            .buffered(self.config.max_parallel.max(1))
            .collect()
            .await;

        let summary = BuildSummary::new(results, started_at);
        info!(
            "Build finished: {} succeeded, {} failed",
            summary.success_count(),
            summary.failure_count()
        );
        summary
    }

    /// Build a single reference, never failing.
    pub async fn run_one(
        &self,
        position: usize,
        total: usize,
        reference: &TemplateReference,
        data: &Value,
        credential: Option<&str>,
    ) -> BuildResult {
        info!("[{}/{}] Processing template: {}", position, total, reference);
        let start = Instant::now();

        let mut manifest = None;
        let mut build_dir = None;
        let outcome = self
            .process(reference, data, credential, &mut manifest, &mut build_dir)
            .await;

        let mut result = match outcome {
            Ok(path) => {
                info!("Template {} built: {}", reference, path.display());
                if let Some(dir) = &build_dir {
                    self.clean_build_dir(dir);
                }
                BuildResult::succeeded(reference.clone(), path)
            }
            Err(e) => {
                error!("Template {} failed: {}", reference, e);
                let failed = BuildResult::failed(reference.clone(), e.to_string());
                match build_dir {
                    Some(dir) => {
                        warn!("Keeping build directory for inspection: {}", dir.display());
                        failed.with_build_dir(dir)
                    }
                    None => failed,
                }
            }
        };

        if let Some(manifest) = manifest {
            result = result.with_template(manifest.name, manifest.template_type.as_str());
        }
        result.with_duration(start.elapsed().as_millis() as u64)
    }

    async fn process(
        &self,
        reference: &TemplateReference,
        data: &Value,
        credential: Option<&str>,
        manifest_slot: &mut Option<TemplateManifest>,
        build_dir_slot: &mut Option<PathBuf>,
    ) -> PipelineResult<PathBuf> {
        let template_dir = self.resolver.resolve(reference, credential).await?;
        debug!("Template {} resolved to {:?}", reference, template_dir);

        let manifest = manifest_slot.insert(load_manifest(&template_dir)?);
        info!("Template: {} ({})", manifest.name, manifest.template_type);

        let data = if self.config.escape_data {
            Cow::Owned(prepare_data(data, manifest.template_type))
        } else {
            Cow::Borrowed(data)
        };

        let build_dir = build_dir_slot.insert(self.renderer.create_build_dir()?);
        let rendered = self
            .renderer
            .render_into(build_dir, &template_dir, manifest, &data)
            .await?;

        self.dispatcher.build(&rendered, manifest).await
    }

    fn clean_build_dir(&self, dir: &Path) {
        if self.config.keep_build_dirs {
            debug!("Keeping build directory {:?}", dir);
            return;
        }
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("Failed to remove build directory {:?}: {}", dir, e);
        }
    }
}
