//! # pause_runner
//!
//! External tool execution for pause.
//!
//! Every external program the build pipeline touches (gomplate, tectonic,
//! typst, gh, the shell used for custom build commands) is invoked through
//! the [`ToolRunner`] trait, so the pipeline can be exercised against a
//! [`MockRunner`] without any of those binaries installed.
//!
//! # Example
//!
//! ```rust,no_run
//! use pause_runner::{Invocation, SystemRunner, ToolRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = SystemRunner::new();
//!
//!     let invocation = Invocation::new("typst")
//!         .arg("compile")
//!         .arg("resume.typ")
//!         .arg("resume.pdf");
//!
//!     let result = runner.run(&invocation).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use error::{RunnerError, RunnerResult};
pub use mock::{MockHandler, MockResponse, MockRunner};
pub use process::SystemRunner;
pub use runner::{ExecutionResult, Invocation, ToolRunner};
