//! Template reference parsing.
//!
//! References come in as newline-delimited text. Each line is normalized to
//! either `builtin:<name>` or a repository URL; no I/O happens here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Templates shipped in the built-in templates directory.
pub const BUILTIN_TEMPLATES: [&str; 3] = ["latex-template", "typst-template", "html-template"];

/// Host prepended to `owner/repo` shorthands.
pub const GITHUB_URL: &str = "https://github.com";

/// Catalog that `official:<name>` references point into.
pub const OFFICIAL_CATALOG_URL: &str = "https://github.com/pause-org/pause-templates";

const BUILTIN_PREFIX: &str = "builtin:";
const OFFICIAL_PREFIX: &str = "official:";
const GITHUB_PREFIX: &str = "github:";

/// A normalized template reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateReference(String);

impl TemplateReference {
    /// Normalize one non-empty reference line against the default
    /// built-in names.
    pub fn parse_line(line: &str) -> Self {
        Self::parse_line_with(line, &BUILTIN_TEMPLATES)
    }

    /// Normalize one non-empty reference line; bare names found in
    /// `builtins` become built-in references.
    pub fn parse_line_with<S: AsRef<str>>(line: &str, builtins: &[S]) -> Self {
        let line = line.trim();

        let normalized = if line.starts_with(BUILTIN_PREFIX) {
            line.to_string()
        } else if builtins.iter().any(|name| name.as_ref() == line) {
            format!("{}{}", BUILTIN_PREFIX, line)
        } else if let Some(name) = line.strip_prefix(OFFICIAL_PREFIX) {
            format!("{}/{}", OFFICIAL_CATALOG_URL, name)
        } else if let Some(repo) = line.strip_prefix(GITHUB_PREFIX) {
            format!("{}/{}", GITHUB_URL, repo)
        } else if line.starts_with("http://") || line.starts_with("https://") {
            line.to_string()
        } else {
            format!("{}/{}", GITHUB_URL, line)
        };

        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_builtin(&self) -> bool {
        self.0.starts_with(BUILTIN_PREFIX)
    }

    /// Name of a built-in template, `None` for remote references.
    pub fn builtin_name(&self) -> Option<&str> {
        self.0.strip_prefix(BUILTIN_PREFIX)
    }

    /// Repository base name, used as the checkout directory name.
    pub fn repo_name(&self) -> Option<&str> {
        if self.is_builtin() {
            return None;
        }
        let trimmed = self.0.trim_end_matches('/');
        let base = trimmed.rsplit('/').next()?;
        let base = base.strip_suffix(".git").unwrap_or(base);
        (!base.is_empty()).then_some(base)
    }

    /// Argument handed to `gh repo clone`: `owner/repo` for GitHub URLs,
    /// the URL itself otherwise.
    pub fn clone_target(&self) -> &str {
        self.0
            .strip_prefix(GITHUB_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for TemplateReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for TemplateReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a references list, one reference per non-blank, non-comment line.
///
/// Order is preserved and duplicates are kept.
pub fn parse_references(input: &str) -> Vec<TemplateReference> {
    parse_references_with(input, &BUILTIN_TEMPLATES)
}

/// Like [`parse_references`], with an explicit set of built-in names.
pub fn parse_references_with<S: AsRef<str>>(input: &str, builtins: &[S]) -> Vec<TemplateReference> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| TemplateReference::parse_line_with(line, builtins))
        .collect()
}
