//! pause CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (including partial failure)
//! - 1: General error
//! - 2: Invalid arguments
//! - 4: Template error
//! - 6: Every template failed to build

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{build::AllTemplatesFailed, Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const ALL_FAILED: u8 = 6;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Refs(args) => commands::refs::execute(args).await,
        Commands::List(args) => commands::list::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "pause=debug"
    } else if quiet {
        "pause=warn"
    } else {
        "pause=info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<AllTemplatesFailed>().is_some() {
        return ExitCodes::ALL_FAILED;
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("template") || msg.contains("manifest") {
        ExitCodes::TEMPLATE_ERROR
    } else if msg.contains("argument") || msg.contains("option") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
