//! Template manifest definitions.
//!
//! A manifest is first parsed into a generic JSON value and then validated
//! into a [`TemplateManifest`], so that every violation in a file can be
//! reported at once instead of failing on the first missing key.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};

/// Fields every manifest must declare.
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "type", "entrypoint", "output_name"];

/// Template type, which decides the compiler and the artifact extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Latex,
    Typst,
    Html,
    Markdown,
}

impl TemplateType {
    pub const ALL: [TemplateType; 4] = [
        TemplateType::Latex,
        TemplateType::Typst,
        TemplateType::Html,
        TemplateType::Markdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Latex => "latex",
            TemplateType::Typst => "typst",
            TemplateType::Html => "html",
            TemplateType::Markdown => "markdown",
        }
    }

    /// Extension of the final artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateType::Latex | TemplateType::Typst => "pdf",
            TemplateType::Html => "html",
            TemplateType::Markdown => "md",
        }
    }

    /// Whether the rendered file is already the final artifact.
    pub fn is_prerendered(&self) -> bool {
        matches!(self, TemplateType::Html | TemplateType::Markdown)
    }

    /// Comma separated list of valid type names.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for TemplateType {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TemplateError::InvalidType {
                value: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Left/right markers of the template syntax handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("[[", "]]")
    }
}

/// Validated template manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateManifest {
    /// Display name
    pub name: String,
    /// Template type
    pub template_type: TemplateType,
    /// Entrypoint, relative to the template directory
    pub entrypoint: String,
    /// Base name of the final artifact, without extension
    pub output_name: String,
    /// Shell command replacing the default compiler
    pub build_cmd: Option<String>,
    /// Template syntax markers
    pub delimiters: Delimiters,
}

impl TemplateManifest {
    /// Validate a parsed manifest document.
    ///
    /// `source` only labels error messages.
    pub fn from_value(value: &Value, source: &Path) -> TemplateResult<Self> {
        let obj = value.as_object().ok_or_else(|| TemplateError::InvalidManifest {
            path: source.to_path_buf(),
            message: "expected a mapping at the top level".to_string(),
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| obj.get(**field).map_or(true, Value::is_null))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingFields(missing));
        }

        let template_type = match &obj["type"] {
            Value::String(s) => s.parse::<TemplateType>()?,
            other => {
                return Err(TemplateError::InvalidType {
                    value: other.to_string(),
                    valid: TemplateType::valid_names(),
                })
            }
        };

        let mut problems = Vec::new();
        let name = string_field(obj, "name", &mut problems);
        let entrypoint = string_field(obj, "entrypoint", &mut problems);
        let output_name = string_field(obj, "output_name", &mut problems);

        let build_cmd = match obj.get("build_cmd") {
            None | Some(Value::Null) => None,
            Some(Value::String(cmd)) if cmd.trim().is_empty() => None,
            Some(Value::String(cmd)) => Some(cmd.clone()),
            Some(_) => {
                problems.push("'build_cmd' must be a string".to_string());
                None
            }
        };

        let delimiters = match obj.get("delimiters") {
            None | Some(Value::Null) => Delimiters::default(),
            Some(Value::Array(items)) => match items.as_slice() {
                [Value::String(left), Value::String(right)] => Delimiters::new(left, right),
                _ => {
                    problems.push("'delimiters' must be a list of two strings".to_string());
                    Delimiters::default()
                }
            },
            Some(_) => {
                problems.push("'delimiters' must be a list of two strings".to_string());
                Delimiters::default()
            }
        };

        if !problems.is_empty() {
            return Err(TemplateError::InvalidManifest {
                path: source.to_path_buf(),
                message: problems.join("; "),
            });
        }

        Ok(Self {
            name,
            template_type,
            entrypoint,
            output_name,
            build_cmd,
            delimiters,
        })
    }

    /// File name of the final artifact, e.g. `resume.pdf`.
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.output_name, self.template_type.extension())
    }
}

fn string_field(obj: &Map<String, Value>, key: &str, problems: &mut Vec<String>) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            problems.push(format!("'{}' must not be empty", key));
            String::new()
        }
        _ => {
            problems.push(format!("'{}' must be a string", key));
            String::new()
        }
    }
}

/// Registry of built-in templates, keyed by directory name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateManifest>,
    templates_path: PathBuf,
}

impl TemplateRegistry {
    pub fn new(templates_path: PathBuf) -> Self {
        Self {
            templates: BTreeMap::new(),
            templates_path,
        }
    }

    /// Register a template under its directory name.
    pub fn register(&mut self, id: impl Into<String>, manifest: TemplateManifest) {
        self.templates.insert(id.into(), manifest);
    }

    /// Get a template by ID.
    pub fn get(&self, id: &str) -> Option<&TemplateManifest> {
        self.templates.get(id)
    }

    /// Check if a template exists.
    pub fn exists(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// List all registered templates, sorted by ID.
    pub fn list(&self) -> Vec<(&str, &TemplateManifest)> {
        self.templates
            .iter()
            .map(|(id, manifest)| (id.as_str(), manifest))
            .collect()
    }

    /// Templates of one type, sorted by ID.
    pub fn by_type(&self, template_type: TemplateType) -> Vec<(&str, &TemplateManifest)> {
        self.templates
            .iter()
            .filter(|(_, t)| t.template_type == template_type)
            .map(|(id, manifest)| (id.as_str(), manifest))
            .collect()
    }

    /// Get the path to a template directory.
    pub fn template_path(&self, id: &str) -> PathBuf {
        self.templates_path.join(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: Value) -> TemplateResult<TemplateManifest> {
        TemplateManifest::from_value(&value, Path::new("template.yaml"))
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(TemplateType::Latex.extension(), "pdf");
        assert_eq!(TemplateType::Typst.extension(), "pdf");
        assert_eq!(TemplateType::Html.extension(), "html");
        assert_eq!(TemplateType::Markdown.extension(), "md");
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("typst".parse::<TemplateType>().unwrap(), TemplateType::Typst);
        let err = "docx".parse::<TemplateType>().unwrap_err();
        assert!(err.to_string().contains("docx"));
        assert!(err.to_string().contains("latex, typst, html, markdown"));
    }

    #[test]
    fn test_valid_manifest_defaults_delimiters() {
        let manifest = validate(json!({
            "name": "Classic",
            "type": "latex",
            "entrypoint": "resume.tex.tmpl",
            "output_name": "resume"
        }))
        .unwrap();

        assert_eq!(manifest.template_type, TemplateType::Latex);
        assert_eq!(manifest.delimiters, Delimiters::new("[[", "]]"));
        assert_eq!(manifest.build_cmd, None);
        assert_eq!(manifest.output_file_name(), "resume.pdf");
    }

    #[test]
    fn test_custom_delimiters_and_build_cmd() {
        let manifest = validate(json!({
            "name": "Web",
            "type": "html",
            "entrypoint": "index.html.tmpl",
            "output_name": "cv",
            "build_cmd": "make cv.html",
            "delimiters": ["{{", "}}"]
        }))
        .unwrap();

        assert_eq!(manifest.delimiters, Delimiters::new("{{", "}}"));
        assert_eq!(manifest.build_cmd.as_deref(), Some("make cv.html"));
        assert_eq!(manifest.output_file_name(), "cv.html");
    }

    #[test]
    fn test_missing_fields_reports_all() {
        let err = validate(json!({ "name": "Broken" })).unwrap_err();
        match err {
            TemplateError::MissingFields(fields) => {
                assert_eq!(fields, vec!["type", "entrypoint", "output_name"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_type_is_named() {
        let err = validate(json!({
            "name": "No type",
            "entrypoint": "resume.typ.tmpl",
            "output_name": "resume"
        }))
        .unwrap_err();
        assert!(matches!(&err, TemplateError::MissingFields(f) if f == &vec!["type".to_string()]));
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_invalid_type() {
        let err = validate(json!({
            "name": "Word",
            "type": "docx",
            "entrypoint": "resume.docx.tmpl",
            "output_name": "resume"
        }))
        .unwrap_err();

        match &err {
            TemplateError::InvalidType { value, valid } => {
                assert_eq!(value, "docx");
                assert_eq!(valid, "latex, typst, html, markdown");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shape_problems_collected() {
        let err = validate(json!({
            "name": 42,
            "type": "typst",
            "entrypoint": "resume.typ.tmpl",
            "output_name": "resume",
            "delimiters": ["<<"]
        }))
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("'name' must be a string"));
        assert!(msg.contains("'delimiters' must be a list of two strings"));
    }

    #[test]
    fn test_registry_by_type() {
        let mut registry = TemplateRegistry::new(PathBuf::from("templates"));
        let manifest = validate(json!({
            "name": "Typst",
            "type": "typst",
            "entrypoint": "resume.typ.tmpl",
            "output_name": "resume"
        }))
        .unwrap();
        registry.register("typst-template", manifest);

        assert!(registry.exists("typst-template"));
        assert_eq!(registry.by_type(TemplateType::Typst)[0].0, "typst-template");
        assert!(registry.by_type(TemplateType::Latex).is_empty());
        assert_eq!(
            registry.template_path("typst-template"),
            PathBuf::from("templates/typst-template")
        );
    }
}
