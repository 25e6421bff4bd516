//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod build;
pub mod list;
pub mod refs;
pub mod validate;

/// pause - build résumé documents from templates
#[derive(Parser)]
#[command(name = "pause")]
#[command(version, about = "pause - build résumé documents from templates")]
#[command(long_about = r#"
pause renders a résumé data file through one or more templates and compiles
each into a finished document (PDF via Tectonic or Typst, or static HTML and
Markdown).

TEMPLATE REFERENCES (one per line):
  latex-template            → built-in template
  builtin:<name>            → built-in template
  official:<name>           → official template catalog
  github:<owner>/<repo>     → GitHub repository
  <owner>/<repo>            → GitHub repository
  https://...               → any clonable repository URL

EXIT CODES:
  0 - Success (some templates may have failed)
  1 - General error
  2 - Invalid arguments
  4 - Template error
  6 - All templates failed
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build documents from a résumé and a list of templates
    Build(build::BuildArgs),

    /// Check template directories for manifest problems
    Validate(validate::ValidateArgs),

    /// Print the normalized form of template references
    Refs(refs::RefsArgs),

    /// List the built-in templates
    List(list::ListArgs),
}

/// Read `@path` arguments from a file; anything else is taken literally.
pub fn read_inline_or_file(value: &str) -> std::io::Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_command() {
        let cli = Cli::try_parse_from([
            "pause",
            "build",
            "--resume",
            "cv.yaml",
            "--templates",
            "latex-template",
            "-j",
            "2",
            "--escape",
        ])
        .unwrap();

        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Build(_)));
    }

    #[test]
    fn test_parse_list_type_filter() {
        let cli = Cli::try_parse_from(["pause", "list", "--type", "typst"]).unwrap();
        assert!(matches!(cli.command, Commands::List(_)));

        assert!(Cli::try_parse_from(["pause", "list", "--type", "docx"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["pause", "-v", "-q", "list"]).is_err());
    }

    #[test]
    fn test_read_inline_or_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("refs.txt");
        std::fs::write(&path, "latex-template\nowner/repo\n").unwrap();

        assert_eq!(read_inline_or_file("typst-template").unwrap(), "typst-template");
        assert_eq!(
            read_inline_or_file(&format!("@{}", path.display())).unwrap(),
            "latex-template\nowner/repo\n"
        );
        assert!(read_inline_or_file("@/nonexistent/refs.txt").is_err());
    }
}
