//! Refs command - Show how template references are interpreted.

use anyhow::{Context, Result};
use clap::Args;

use pause_templates::parse_references;

use super::read_inline_or_file;

#[derive(Args)]
pub struct RefsArgs {
    /// Template references, one per line, or @file to read them from a file
    references: String,
}

pub async fn execute(args: RefsArgs) -> Result<()> {
    let input = read_inline_or_file(&args.references)
        .with_context(|| format!("Failed to read template references from {}", args.references))?;

    for reference in parse_references(&input) {
        let kind = if reference.is_builtin() { "built-in" } else { "remote" };
        println!("{:<9} {}", kind, reference);
    }

    Ok(())
}
