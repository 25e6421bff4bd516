//! Compiler dispatch.
//!
//! Turns a rendered template into its final artifact inside the build
//! directory, named `<output_name>.<ext>`, then relocates it to the output
//! directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pause_runner::{Invocation, ToolRunner};
use pause_templates::{RenderedTemplate, TemplateManifest, TemplateType};
use tracing::{debug, info};

use crate::config::ToolPaths;
use crate::error::{PipelineError, PipelineResult};
use crate::relocate::relocate;

/// Characters of rendered LaTeX source included in a compile error.
pub const SOURCE_EXCERPT_CHARS: usize = 500;

/// Compile step selected for a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStep {
    /// Manifest `build_cmd`, run through the shell
    Custom(String),
    /// tectonic, then rename to `output_name`
    Latex,
    /// typst with an explicit output path
    Typst,
    /// The rendered file already is the artifact
    Passthrough,
}

impl CompileStep {
    /// A `build_cmd` always wins over the type's default compiler.
    pub fn for_manifest(manifest: &TemplateManifest) -> Self {
        if let Some(cmd) = &manifest.build_cmd {
            return Self::Custom(cmd.clone());
        }
        match manifest.template_type {
            TemplateType::Latex => Self::Latex,
            TemplateType::Typst => Self::Typst,
            TemplateType::Html | TemplateType::Markdown => Self::Passthrough,
        }
    }

    /// Resolve a compile step from a raw type name.
    pub fn for_type_name(name: &str, build_cmd: Option<&str>) -> PipelineResult<Self> {
        if let Some(cmd) = build_cmd {
            return Ok(Self::Custom(cmd.to_string()));
        }
        let template_type: TemplateType = name
            .parse()
            .map_err(|_| PipelineError::UnsupportedType(name.to_string()))?;
        Ok(match template_type {
            TemplateType::Latex => Self::Latex,
            TemplateType::Typst => Self::Typst,
            TemplateType::Html | TemplateType::Markdown => Self::Passthrough,
        })
    }
}

/// Runs the compiler matching a template and places the artifact.
pub struct CompilerDispatcher {
    output_dir: PathBuf,
    tools: ToolPaths,
    runner: Arc<dyn ToolRunner>,
}

impl CompilerDispatcher {
    pub fn new(output_dir: impl Into<PathBuf>, tools: ToolPaths, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            output_dir: output_dir.into(),
            tools,
            runner,
        }
    }

    /// Final location of a manifest's artifact.
    pub fn output_path(&self, manifest: &TemplateManifest) -> PathBuf {
        self.output_dir.join(manifest.output_file_name())
    }

    /// Compile and relocate; returns the artifact's final path.
    pub async fn build(
        &self,
        rendered: &RenderedTemplate,
        manifest: &TemplateManifest,
    ) -> PipelineResult<PathBuf> {
        let staged = self.compile(rendered, manifest).await?;
        let target = self.output_path(manifest);
        let method = relocate(&staged, &target)?;
        debug!("Relocated {:?} -> {:?} ({:?})", staged, target, method);
        Ok(target)
    }

    /// Compile inside the build directory; returns the staged artifact,
    /// already named `<output_name>.<ext>`.
    pub async fn compile(
        &self,
        rendered: &RenderedTemplate,
        manifest: &TemplateManifest,
    ) -> PipelineResult<PathBuf> {
        let build_dir = &rendered.build_dir;
        let staged = build_dir.join(manifest.output_file_name());

        match CompileStep::for_manifest(manifest) {
            CompileStep::Custom(cmd) => {
                info!("Running custom build command: {}", cmd);
                let invocation = Invocation::new(&self.tools.shell)
                    .arg("-c")
                    .arg(cmd)
                    .current_dir(build_dir);
                self.run_compiler(&invocation).await?;
                if !staged.is_file() {
                    return Err(PipelineError::CompileFailure(format!(
                        "build command finished but {} was not found in the build directory",
                        manifest.output_file_name()
                    )));
                }
            }
            CompileStep::Latex => {
                info!("Building LaTeX with Tectonic...");
                let invocation = Invocation::new(&self.tools.tectonic)
                    .path_arg(&rendered.path)
                    .arg("--outdir")
                    .path_arg(build_dir)
                    .current_dir(build_dir);
                if let Err(e) = self.run_compiler(&invocation).await {
                    return Err(with_source_excerpt(e, &rendered.path));
                }

                // tectonic names the PDF after its input file.
                let produced = rendered.path.with_extension("pdf");
                if !produced.is_file() {
                    return Err(PipelineError::CompileFailure(format!(
                        "{} did not produce {}",
                        self.tools.tectonic,
                        produced.display()
                    )));
                }
                rename_within(&produced, &staged)?;
            }
            CompileStep::Typst => {
                info!("Building Typst document...");
                let invocation = Invocation::new(&self.tools.typst)
                    .arg("compile")
                    .path_arg(&rendered.path)
                    .path_arg(&staged)
                    .current_dir(build_dir);
                self.run_compiler(&invocation).await?;
                if !staged.is_file() {
                    return Err(PipelineError::CompileFailure(format!(
                        "{} did not produce {}",
                        self.tools.typst,
                        staged.display()
                    )));
                }
            }
            CompileStep::Passthrough => {
                info!("Static output: {:?}", rendered.path);
                rename_within(&rendered.path, &staged)?;
            }
        }

        Ok(staged)
    }

    async fn run_compiler(&self, invocation: &Invocation) -> PipelineResult<()> {
        let result = self
            .runner
            .run(invocation)
            .await
            .map_err(|e| PipelineError::CompileFailure(e.to_string()))?;
        if !result.success() {
            return Err(PipelineError::CompileFailure(result.failure_summary()));
        }
        Ok(())
    }
}

fn rename_within(from: &Path, to: &Path) -> PipelineResult<()> {
    if from != to {
        debug!("Renaming {:?} -> {:?}", from, to);
        fs::rename(from, to)?;
    }
    Ok(())
}

fn with_source_excerpt(err: PipelineError, source: &Path) -> PipelineError {
    match (err, fs::read_to_string(source)) {
        (PipelineError::CompileFailure(message), Ok(text)) => {
            let excerpt: String = text.chars().take(SOURCE_EXCERPT_CHARS).collect();
            PipelineError::CompileFailure(format!(
                "{}\n--- rendered source (first {} characters) ---\n{}",
                message, SOURCE_EXCERPT_CHARS, excerpt
            ))
        }
        (err, _) => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pause_runner::{MockResponse, MockRunner};
    use pause_templates::Delimiters;
    use tempfile::tempdir;

    fn manifest(template_type: TemplateType, build_cmd: Option<&str>) -> TemplateManifest {
        TemplateManifest {
            name: "Test".into(),
            template_type,
            entrypoint: "ignored".into(),
            output_name: "resume".into(),
            build_cmd: build_cmd.map(String::from),
            delimiters: Delimiters::default(),
        }
    }

    fn rendered(build_dir: &Path, file: &str, content: &str) -> RenderedTemplate {
        fs::create_dir_all(build_dir).unwrap();
        let path = build_dir.join(file);
        fs::write(&path, content).unwrap();
        RenderedTemplate {
            path,
            build_dir: build_dir.to_path_buf(),
            support_files: Vec::new(),
        }
    }

    /// Mock tectonic writing `<input stem>.pdf` into `--outdir`.
    fn fake_tectonic() -> MockRunner {
        MockRunner::new().on("tectonic", |inv: &Invocation| {
            let input = Path::new(&inv.args[0]);
            let outdir = Path::new(inv.arg_after("--outdir").unwrap());
            let pdf = outdir.join(input.file_stem().unwrap()).with_extension("pdf");
            fs::write(pdf, b"%PDF").unwrap();
            MockResponse::success("")
        })
    }

    #[test]
    fn test_step_selection() {
        assert_eq!(
            CompileStep::for_manifest(&manifest(TemplateType::Latex, None)),
            CompileStep::Latex
        );
        assert_eq!(
            CompileStep::for_manifest(&manifest(TemplateType::Markdown, None)),
            CompileStep::Passthrough
        );
        assert_eq!(
            CompileStep::for_manifest(&manifest(TemplateType::Typst, Some("make"))),
            CompileStep::Custom("make".into())
        );
    }

    #[test]
    fn test_unsupported_type_name() {
        let err = CompileStep::for_type_name("docx", None).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedType(ref t) if t == "docx"));
        assert_eq!(
            CompileStep::for_type_name("docx", Some("pandoc x -o resume.pdf")).unwrap(),
            CompileStep::Custom("pandoc x -o resume.pdf".into())
        );
        assert_eq!(CompileStep::for_type_name("typst", None).unwrap(), CompileStep::Typst);
    }

    #[tokio::test]
    async fn test_latex_output_renamed_to_output_name() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "cv-source.tex", "\\documentclass{article}");
        let out = temp.path().join("out");
        let runner = fake_tectonic();
        let dispatcher = CompilerDispatcher::new(&out, ToolPaths::default(), Arc::new(runner.clone()));

        let path = dispatcher
            .build(&rendered, &manifest(TemplateType::Latex, None))
            .await
            .unwrap();

        assert_eq!(path, out.join("resume.pdf"));
        assert!(path.is_file());
        assert!(!rendered.build_dir.join("cv-source.pdf").exists());
        assert!(!rendered.build_dir.join("resume.pdf").exists());
        let call = &runner.get_program_calls("tectonic")[0];
        assert_eq!(call.workdir.as_deref(), Some(rendered.build_dir.as_path()));
    }

    #[tokio::test]
    async fn test_latex_failure_includes_source_excerpt() {
        let temp = tempdir().unwrap();
        let source = format!("\\badmacro{{}}{}", "x".repeat(1000));
        let rendered = rendered(&temp.path().join("build"), "resume.tex", &source);
        let runner = MockRunner::new().add_response(MockResponse::failure(1, "! Undefined control sequence."));
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(runner));

        let err = dispatcher
            .build(&rendered, &manifest(TemplateType::Latex, None))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Undefined control sequence"));
        assert!(msg.contains("\\badmacro{}"));
        assert!(!msg.contains(&"x".repeat(SOURCE_EXCERPT_CHARS)));
    }

    #[tokio::test]
    async fn test_typst_explicit_output_path() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "resume.typ", "= Ada");
        let runner = MockRunner::new().on("typst", |inv: &Invocation| {
            fs::write(&inv.args[2], b"%PDF").unwrap();
            MockResponse::success("")
        });
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(runner.clone()));

        let mut m = manifest(TemplateType::Typst, None);
        m.output_name = "cv".into();
        let path = dispatcher.build(&rendered, &m).await.unwrap();

        assert_eq!(path, temp.path().join("out/cv.pdf"));
        let call = &runner.get_program_calls("typst")[0];
        assert_eq!(call.args[0], "compile");
        assert!(call.args[2].ends_with("cv.pdf"));
    }

    #[tokio::test]
    async fn test_passthrough_renames_markdown() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "README.md", "# Ada");
        let runner = MockRunner::new();
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(runner.clone()));

        let path = dispatcher
            .build(&rendered, &manifest(TemplateType::Markdown, None))
            .await
            .unwrap();

        assert_eq!(path, temp.path().join("out/resume.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Ada");
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_command_runs_in_build_dir() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "resume.tex", "x");
        let runner = MockRunner::new().on("sh", |inv: &Invocation| {
            let dir = inv.workdir.clone().unwrap();
            fs::write(dir.join("resume.pdf"), b"%PDF").unwrap();
            MockResponse::success("")
        });
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(runner.clone()));

        let path = dispatcher
            .build(&rendered, &manifest(TemplateType::Latex, Some("latexmk -pdf resume.tex")))
            .await
            .unwrap();

        assert_eq!(path, temp.path().join("out/resume.pdf"));
        assert!(!runner.was_called("tectonic"));
        assert_eq!(runner.get_program_calls("sh")[0].args, vec!["-c", "latexmk -pdf resume.tex"]);
    }

    #[tokio::test]
    async fn test_custom_command_without_output() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "index.html", "<p>");
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(MockRunner::new()));

        let err = dispatcher
            .build(&rendered, &manifest(TemplateType::Html, Some("true")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::CompileFailure(ref m) if m.contains("resume.html")));
    }

    #[tokio::test]
    async fn test_missing_compiler_is_compile_failure() {
        let temp = tempdir().unwrap();
        let rendered = rendered(&temp.path().join("build"), "resume.typ", "= Ada");
        let runner = MockRunner::new().missing_program("typst");
        let dispatcher = CompilerDispatcher::new(temp.path().join("out"), ToolPaths::default(), Arc::new(runner));

        let err = dispatcher
            .build(&rendered, &manifest(TemplateType::Typst, None))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::CompileFailure(_)));
    }
}
