//! # pause_templates
//!
//! Template handling for pause.
//!
//! A template is a directory holding a manifest (`template.yaml`,
//! `template.yml` or `template.json`) and an entrypoint rendered by gomplate.
//! This crate covers everything up to the rendered intermediate file:
//!
//! - Parsing the newline-delimited template reference list
//! - Resolving references to local directories (built-in or cloned)
//! - Loading and validating manifests
//! - Rendering the entrypoint into an isolated build directory
//! - Escaping profile data for the target markup
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pause_runner::SystemRunner;
//! use pause_templates::{load_manifest, parse_references, TemplateRenderer, TemplateResolver};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(SystemRunner::new());
//! let resolver = TemplateResolver::new("templates", "/tmp/pause-templates", runner.clone());
//! let renderer = TemplateRenderer::new("/tmp/pause-templates", runner);
//!
//! let data = serde_json::json!({ "basics": { "name": "Ada Lovelace" } });
//! for reference in parse_references("latex-template\nowner/my-template") {
//!     let dir = resolver.resolve(&reference, None).await?;
//!     let manifest = load_manifest(&dir)?;
//!     let rendered = renderer.render(&dir, &manifest, &data).await?;
//!     println!("{} -> {:?}", reference, rendered.path);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod escape;
pub mod loader;
pub mod manifest;
pub mod reference;
pub mod renderer;
pub mod resolver;

pub use error::{TemplateError, TemplateResult};
pub use escape::{deep_escape, escape_html, escape_latex, escape_typst, prepare_data};
pub use loader::{find_manifest, load_manifest, ManifestFormat, TemplateLoader, MANIFEST_CANDIDATES};
pub use manifest::{Delimiters, TemplateManifest, TemplateRegistry, TemplateType};
pub use reference::{
    parse_references, parse_references_with, TemplateReference, BUILTIN_TEMPLATES, OFFICIAL_CATALOG_URL,
};
pub use renderer::{rendered_file_name, RenderedTemplate, TemplateRenderer};
pub use resolver::{should_fall_back, CloneStrategy, TemplateResolver};
