//! # pause_core
//!
//! Build pipeline for pause.
//!
//! Drives each template reference through resolve → load manifest →
//! render → compile → relocate, and collects one [`BuildResult`] per
//! reference. A failing reference is recorded and never aborts the batch.
//!
//! # Architecture
//!
//! - **Config**: [`BuildConfig`] carries every directory, tool name and
//!   switch; nothing reads the process environment
//! - **Compiler**: [`CompilerDispatcher`] picks the compile step for a
//!   manifest and names the artifact after `output_name`
//! - **Relocation**: [`relocate`] moves artifacts into the output directory,
//!   copying when a rename is not possible
//! - **Pipeline**: [`Pipeline`] orchestrates a batch, optionally in parallel,
//!   returning results in input order
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pause_core::{BuildConfig, Pipeline};
//! use pause_runner::SystemRunner;
//! use pause_templates::parse_references;
//!
//! # async fn demo() {
//! let config = BuildConfig::new().output_dir("dist").max_parallel(2);
//! let pipeline = Pipeline::new(config, Arc::new(SystemRunner::new()));
//!
//! let data = serde_json::json!({ "basics": { "name": "Ada Lovelace" } });
//! let refs = parse_references("latex-template\ntypst-template");
//! let summary = pipeline.run(&refs, &data, None).await;
//!
//! for result in summary.successful() {
//!     println!("{}", result.output_path.display());
//! }
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod relocate;
pub mod result;

pub use compiler::{CompileStep, CompilerDispatcher, SOURCE_EXCERPT_CHARS};
pub use config::{BuildConfig, ToolPaths};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::Pipeline;
pub use relocate::{relocate, relocate_with, RelocationMethod};
pub use result::{BuildResult, BuildSummary};
