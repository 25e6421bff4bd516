//! List command - Show built-in templates.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pause_templates::{TemplateLoader, TemplateType};

#[derive(Args)]
pub struct ListArgs {
    /// Directory holding the built-in templates
    #[arg(long, env = "PAUSE_TEMPLATES", default_value = "templates")]
    builtin_root: PathBuf,

    /// Only list templates of this type (latex, typst, html, markdown)
    #[arg(short = 't', long = "type")]
    template_type: Option<TemplateType>,
}

pub async fn execute(args: ListArgs) -> Result<()> {
    if !args.builtin_root.is_dir() {
        anyhow::bail!("Templates directory not found: {}", args.builtin_root.display());
    }

    let registry = TemplateLoader::new(&args.builtin_root)
        .load_all()
        .context("Failed to load templates")?;

    let templates = match args.template_type {
        Some(template_type) => registry.by_type(template_type),
        None => registry.list(),
    };
    if templates.is_empty() {
        println!("⚠️  No templates found in {}", args.builtin_root.display());
        return Ok(());
    }

    println!("📦 Built-in templates:\n");
    for (id, manifest) in templates {
        println!(
            "  {:<18} {:<8} {} → {}",
            id,
            manifest.template_type,
            manifest.name,
            manifest.output_file_name()
        );
        println!("  {:<18} {}", "", registry.template_path(id).display());
    }

    Ok(())
}
