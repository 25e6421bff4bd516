//! Manifest discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::{TemplateManifest, TemplateRegistry};

/// Manifest file names, in priority order.
pub const MANIFEST_CANDIDATES: [&str; 4] = [
    "template.yaml",
    "template.yml",
    "template.json",
    "template.toml",
];

/// Manifest serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse manifest text into a generic document.
    fn parse(&self, content: &str, path: &Path) -> TemplateResult<Value> {
        let invalid = |message: String| TemplateError::InvalidManifest {
            path: path.to_path_buf(),
            message,
        };
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| invalid(e.to_string())),
            Self::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
            // Listed as a candidate but there is no TOML parser.
            Self::Toml => Err(TemplateError::UnsupportedFormat(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
        }
    }
}

/// First manifest candidate present in `dir`.
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load and validate the manifest of a template directory.
pub fn load_manifest(dir: &Path) -> TemplateResult<TemplateManifest> {
    let path = find_manifest(dir).ok_or_else(|| TemplateError::ManifestNotFound {
        dir: dir.to_path_buf(),
        expected: MANIFEST_CANDIDATES.join(", "),
    })?;

    debug!("Loading manifest from {:?}", path);
    let format = ManifestFormat::from_path(&path)
        .ok_or_else(|| TemplateError::UnsupportedFormat(path.display().to_string()))?;
    let content = fs::read_to_string(&path).map_err(|e| TemplateError::io_at(&path, e))?;
    let document = format.parse(&content, &path)?;

    TemplateManifest::from_value(&document, &path)
}

/// Template loader for a directory of templates.
pub struct TemplateLoader {
    templates_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    /// Load every template directory directly under the templates path.
    ///
    /// Directories whose manifest fails to load are skipped with a warning.
    pub fn load_all(&self) -> TemplateResult<TemplateRegistry> {
        let mut registry = TemplateRegistry::new(self.templates_path.clone());

        if !self.templates_path.exists() {
            warn!("Templates directory does not exist: {:?}", self.templates_path);
            return Ok(registry);
        }

        for entry in WalkDir::new(&self.templates_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match load_manifest(path) {
                Ok(manifest) => {
                    info!("Loaded template: {} ({})", manifest.name, id);
                    registry.register(id, manifest);
                }
                Err(e) => {
                    warn!("Failed to load template from {:?}: {}", path, e);
                }
            }
        }

        Ok(registry)
    }

    /// Load a single template from a directory.
    pub fn load_template(&self, path: &Path) -> TemplateResult<TemplateManifest> {
        load_manifest(path)
    }

    /// Check a template directory and list everything wrong with it.
    pub fn validate_template(&self, path: &Path) -> Vec<String> {
        self.inspect_template(path).1
    }

    /// Load a template's manifest and list everything wrong with the
    /// template. The manifest is `None` when it could not be loaded.
    pub fn inspect_template(&self, path: &Path) -> (Option<TemplateManifest>, Vec<String>) {
        let mut issues = Vec::new();

        if !path.is_dir() {
            issues.push(format!("Not a directory: {}", path.display()));
            return (None, issues);
        }

        let manifest = match load_manifest(path) {
            Ok(manifest) => manifest,
            Err(e) => {
                issues.push(e.to_string());
                return (None, issues);
            }
        };

        let entrypoint = path.join(&manifest.entrypoint);
        if !entrypoint.is_file() {
            issues.push(format!(
                "Entrypoint does not exist: {}",
                manifest.entrypoint
            ));
        }
        if manifest.delimiters.left.is_empty() || manifest.delimiters.right.is_empty() {
            issues.push("Delimiters must not be empty".to_string());
        }

        (Some(manifest), issues)
    }
}
