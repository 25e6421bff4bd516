//! Validate command - Check template directories.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use pause_templates::TemplateLoader;

#[derive(Args)]
pub struct ValidateArgs {
    /// Template directories to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating {} template(s)", args.paths.len());

    let mut failed = 0;

    for path in &args.paths {
        print!("Checking {}... ", path.display());

        let loader = TemplateLoader::new(path.parent().unwrap_or(path));
        let (manifest, issues) = loader.inspect_template(path);

        if let (Some(manifest), true) = (&manifest, issues.is_empty()) {
            println!(
                "✅ {} ({} → {})",
                manifest.name,
                manifest.template_type,
                manifest.output_file_name()
            );
        } else {
            println!("❌");
            failed += 1;
            for issue in issues {
                println!("   - {}", issue);
            }
        }
    }

    println!();
    println!(
        "Results: {} passed, {} failed",
        args.paths.len() - failed,
        failed
    );

    if failed > 0 {
        anyhow::bail!("{} template(s) failed validation", failed);
    }

    Ok(())
}
