//! Build command - Render and compile templates.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use pause_core::{BuildConfig, BuildSummary, Pipeline};
use pause_runner::SystemRunner;
use pause_templates::parse_references;

use super::read_inline_or_file;

/// Returned when a non-empty batch produced no artifact.
#[derive(Debug, Error)]
#[error("All {0} template(s) failed to build")]
pub struct AllTemplatesFailed(pub usize);

#[derive(Args)]
pub struct BuildArgs {
    /// Résumé data file (JSON; YAML when the extension is .yaml or .yml)
    #[arg(short, long, default_value = "resume.json")]
    resume: PathBuf,

    /// Template references, one per line, or @file to read them from a file
    #[arg(short, long)]
    templates: String,

    /// Directory receiving the built documents
    #[arg(short, long, env = "PAUSE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Scratch directory for checkouts and build directories
    #[arg(long, env = "RUNNER_TEMP")]
    work_dir: Option<PathBuf>,

    /// Directory holding the built-in templates
    #[arg(long, env = "PAUSE_TEMPLATES")]
    builtin_root: Option<PathBuf>,

    /// Token used to clone private template repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Number of templates built at the same time
    #[arg(short = 'j', long)]
    parallel: Option<usize>,

    /// Escape résumé strings for the template's markup before rendering
    #[arg(long)]
    escape: bool,

    /// Keep build directories of successful builds
    #[arg(long)]
    keep_build_dirs: bool,

    /// YAML configuration file; command-line options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the build summary as JSON to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// File receiving step outputs (artifacts, success_count, failure_count)
    #[arg(long, env = "GITHUB_OUTPUT", hide_env_values = true)]
    github_output: Option<PathBuf>,
}

pub async fn execute(args: BuildArgs) -> Result<()> {
    let config = build_config(&args)?;

    let data = load_resume(&args.resume)?;
    let name = data
        .pointer("/basics/name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    println!("🎬 Building résumé for: {}", name);

    let input = read_inline_or_file(&args.templates)
        .with_context(|| format!("Failed to read template references from {}", args.templates))?;
    let references = parse_references(&input);
    if references.is_empty() {
        anyhow::bail!("No template references given (argument --templates is empty)");
    }
    println!("📋 Found {} template(s)", references.len());

    let pipeline = Pipeline::new(config, Arc::new(SystemRunner::new()));

    for tool in pipeline.missing_tools().await {
        warn!("{} is not available; templates that need it will fail", tool);
    }

    let token = args.token.as_deref().filter(|t| !t.is_empty());
    let summary = pipeline.run(&references, &data, token).await;

    print_summary(&summary);

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!("Summary written to {:?}", path);
    }

    if let Some(path) = &args.github_output {
        write_step_outputs(path, &summary)
            .with_context(|| format!("Failed to write step outputs to {}", path.display()))?;
    }

    if summary.all_failed() {
        return Err(AllTemplatesFailed(summary.failure_count()).into());
    }
    if summary.failure_count() > 0 {
        warn!("{} template(s) failed to build", summary.failure_count());
    }

    println!("🎉 Done!");
    Ok(())
}

fn build_config(args: &BuildArgs) -> Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => BuildConfig::default(),
    };

    if let Some(dir) = &args.output_dir {
        config = config.output_dir(dir);
    }
    if let Some(dir) = &args.work_dir {
        config = config.work_dir(dir.join("pause-templates"));
    }
    if let Some(dir) = &args.builtin_root {
        config = config.builtin_root(dir);
    }
    if let Some(n) = args.parallel {
        if n == 0 {
            anyhow::bail!("Invalid argument --parallel: must be at least 1");
        }
        config = config.max_parallel(n);
    }
    if args.escape {
        config = config.escape_data(true);
    }
    if args.keep_build_dirs {
        config = config.keep_build_dirs(true);
    }

    config.validate()?;
    Ok(config)
}

/// Load résumé data; YAML by extension, JSON otherwise.
pub fn load_resume(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Résumé file not found: {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let data = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(data)
}

fn print_summary(summary: &BuildSummary) {
    println!();
    println!("📊 Build Summary");
    println!("   ✅ Successful: {}", summary.success_count());
    println!("   ❌ Failed: {}", summary.failure_count());

    if summary.success_count() > 0 {
        println!();
        println!("Generated artifacts:");
        for result in summary.successful() {
            println!("  - {}", result.output_path.display());
        }
    }

    for result in summary.failed() {
        println!(
            "  ❌ {}: {}",
            result.reference,
            result.error.as_deref().unwrap_or("unknown error")
        );
        if let Some(dir) = &result.build_dir {
            println!("     build directory kept at {}", dir.display());
        }
    }
}

/// Step outputs as `key=value` lines; artifacts are comma-separated.
pub fn step_outputs(summary: &BuildSummary) -> String {
    let artifacts: Vec<String> = summary
        .artifacts()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    format!(
        "artifacts={}\nsuccess_count={}\nfailure_count={}\n",
        artifacts.join(","),
        summary.success_count(),
        summary.failure_count()
    )
}

fn write_step_outputs(path: &Path, summary: &BuildSummary) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(step_outputs(summary).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pause_core::BuildResult;
    use pause_templates::TemplateReference;
    use tempfile::tempdir;

    #[test]
    fn test_step_outputs() {
        let summary = BuildSummary::new(
            vec![
                BuildResult::succeeded(
                    TemplateReference::parse_line("latex-template"),
                    "out/resume-latex.pdf".into(),
                ),
                BuildResult::failed(TemplateReference::parse_line("owner/repo"), "clone failed"),
                BuildResult::succeeded(
                    TemplateReference::parse_line("html-template"),
                    "out/index.html".into(),
                ),
            ],
            Utc::now(),
        );

        assert_eq!(
            step_outputs(&summary),
            "artifacts=out/resume-latex.pdf,out/index.html\nsuccess_count=2\nfailure_count=1\n"
        );
    }

    #[test]
    fn test_load_resume_yaml_and_json() {
        let temp = tempdir().unwrap();
        let yaml = temp.path().join("resume.yaml");
        fs::write(&yaml, "basics:\n  name: Ada\n").unwrap();
        let json = temp.path().join("resume.json");
        fs::write(&json, r#"{"basics": {"name": "Ada"}}"#).unwrap();

        assert_eq!(load_resume(&yaml).unwrap(), load_resume(&json).unwrap());
    }

    #[test]
    fn test_load_resume_invalid_json() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("resume.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_resume(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
