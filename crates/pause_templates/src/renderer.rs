//! Template rendering with gomplate.
//!
//! Each render gets its own build directory under the work directory, so
//! intermediate files of one template never collide with another's, even
//! when several templates render at the same time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pause_runner::{Invocation, ToolRunner};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::{TemplateManifest, TemplateType};

/// Data file written into every build directory.
pub const DATA_FILE_NAME: &str = ".resume-data.json";

/// Suffix marking a file as a template source.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// LaTeX support files copied next to the rendered source.
const LATEX_SUPPORT_PATTERNS: [&str; 4] = ["*.cls", "*.sty", "*.bst", "*.bib"];

/// A rendered entrypoint and the build directory holding it.
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    /// Rendered file, inside `build_dir`
    pub path: PathBuf,
    /// Isolated build directory owned by this render
    pub build_dir: PathBuf,
    /// Support files copied into `build_dir`
    pub support_files: Vec<PathBuf>,
}

/// Name of the rendered file: the entrypoint's base name without the
/// template suffix (`resume.tex.tmpl` renders to `resume.tex`).
pub fn rendered_file_name(entrypoint: &str) -> String {
    let base = Path::new(entrypoint)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entrypoint.to_string());
    match base.strip_suffix(TEMPLATE_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => base,
    }
}

/// Renders template entrypoints against profile data.
pub struct TemplateRenderer {
    work_dir: PathBuf,
    runner: Arc<dyn ToolRunner>,
    program: String,
}

impl TemplateRenderer {
    /// Create a renderer using `gomplate` from the invocation path.
    pub fn new(work_dir: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            work_dir: work_dir.into(),
            runner,
            program: "gomplate".to_string(),
        }
    }

    /// Use a different gomplate executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Create a fresh, uniquely named build directory.
    pub fn create_build_dir(&self) -> TemplateResult<PathBuf> {
        let dir = self
            .work_dir
            .join(format!("build-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).map_err(|e| TemplateError::io_at(&dir, e))?;
        // Tools run with the build directory as cwd, so hand them absolute paths.
        fs::canonicalize(&dir).map_err(|e| TemplateError::io_at(&dir, e))
    }

    /// Render the manifest's entrypoint into a new build directory.
    pub async fn render(
        &self,
        template_dir: &Path,
        manifest: &TemplateManifest,
        data: &Value,
    ) -> TemplateResult<RenderedTemplate> {
        locate_entrypoint(template_dir, manifest)?;
        let build_dir = self.create_build_dir()?;
        self.render_into(&build_dir, template_dir, manifest, data).await
    }

    /// Render the manifest's entrypoint into an existing build directory.
    ///
    /// The build directory is left in place on failure.
    pub async fn render_into(
        &self,
        build_dir: &Path,
        template_dir: &Path,
        manifest: &TemplateManifest,
        data: &Value,
    ) -> TemplateResult<RenderedTemplate> {
        let entrypoint = locate_entrypoint(template_dir, manifest)?;

        let data_path = build_dir.join(DATA_FILE_NAME);
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&data_path, serialized).map_err(|e| TemplateError::io_at(&data_path, e))?;

        let output_path = build_dir.join(rendered_file_name(&manifest.entrypoint));

        let invocation = Invocation::new(&self.program)
            .arg("--file")
            .path_arg(&entrypoint)
            .arg("--out")
            .path_arg(&output_path)
            .arg("--datasource")
            .arg(format!("resume={}", data_path.display()))
            .args(["--context", ".=resume"])
            .arg("--left-delim")
            .arg(&manifest.delimiters.left)
            .arg("--right-delim")
            .arg(&manifest.delimiters.right)
            .args(["--missing-key", "zero"])
            .current_dir(build_dir);

        let result = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| TemplateError::RenderFailure(e.to_string()))?;
        if !result.success() {
            return Err(TemplateError::RenderFailure(result.failure_summary()));
        }
        if !output_path.is_file() {
            return Err(TemplateError::RenderFailure(format!(
                "{} did not produce {}",
                self.program,
                output_path.display()
            )));
        }

        info!("Rendered {} -> {:?}", manifest.entrypoint, output_path);

        let support_files = if manifest.template_type == TemplateType::Latex {
            copy_latex_support_files(template_dir, build_dir)
        } else {
            Vec::new()
        };

        Ok(RenderedTemplate {
            path: output_path,
            build_dir: build_dir.to_path_buf(),
            support_files,
        })
    }
}

/// Absolute path of the manifest's entrypoint, which must be a file.
fn locate_entrypoint(template_dir: &Path, manifest: &TemplateManifest) -> TemplateResult<PathBuf> {
    let entrypoint = template_dir.join(&manifest.entrypoint);
    let entrypoint =
        fs::canonicalize(&entrypoint).map_err(|e| TemplateError::io_at(&entrypoint, e))?;
    if !entrypoint.is_file() {
        return Err(TemplateError::io_at(
            &entrypoint,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "entrypoint is not a file"),
        ));
    }
    Ok(entrypoint)
}

/// Copy class/style/bibliography files sitting directly in the template
/// directory. Failures are logged and skipped.
fn copy_latex_support_files(template_dir: &Path, build_dir: &Path) -> Vec<PathBuf> {
    let base = glob::Pattern::escape(&template_dir.to_string_lossy());
    let mut copied = Vec::new();

    for pattern in LATEX_SUPPORT_PATTERNS {
        let full = format!("{}/{}", base, pattern);
        let paths = match glob::glob(&full) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid support file pattern {}: {}", full, e);
                continue;
            }
        };

        for entry in paths {
            let source = match entry {
                Ok(path) if path.is_file() => path,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Could not read support file: {}", e);
                    continue;
                }
            };
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = build_dir.join(name);
            match fs::copy(&source, &target) {
                Ok(_) => {
                    debug!("Copied support file {:?}", name);
                    copied.push(target);
                }
                Err(e) => warn!("Failed to copy {:?} to build directory: {}", source, e),
            }
        }
    }

    copied
}
