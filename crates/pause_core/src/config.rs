//! Build configuration.
//!
//! Everything the pipeline needs from its surroundings (directories, tool
//! names, switches) is carried here explicitly and handed to each component
//! at construction time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// External executables used by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolPaths {
    /// Template renderer
    pub gomplate: String,
    /// LaTeX compiler
    pub tectonic: String,
    /// Typst compiler
    pub typst: String,
    /// GitHub CLI, used to clone remote templates
    pub gh: String,
    /// Shell running custom `build_cmd`s
    pub shell: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            gomplate: "gomplate".to_string(),
            tectonic: "tectonic".to_string(),
            typst: "typst".to_string(),
            gh: "gh".to_string(),
            shell: "sh".to_string(),
        }
    }
}

impl ToolPaths {
    /// Tools probed before a build, in probe order.
    pub fn all(&self) -> [&str; 4] {
        [
            self.gomplate.as_str(),
            self.tectonic.as_str(),
            self.typst.as_str(),
            self.gh.as_str(),
        ]
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the built-in templates
    pub builtin_root: PathBuf,
    /// Scratch root for checkouts and build directories
    pub work_dir: PathBuf,
    /// Where finished artifacts are placed
    pub output_dir: PathBuf,
    /// References processed at the same time
    pub max_parallel: usize,
    /// Escape string values for the template's markup before rendering
    pub escape_data: bool,
    /// Keep build directories of successful builds
    pub keep_build_dirs: bool,
    /// External executables
    pub tools: ToolPaths,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            builtin_root: PathBuf::from("templates"),
            work_dir: std::env::temp_dir().join("pause-templates"),
            output_dir: PathBuf::from("."),
            max_parallel: 1,
            escape_data: false,
            keep_build_dirs: false,
            tools: ToolPaths::default(),
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a YAML configuration file; absent keys take their defaults.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_parallel == 0 {
            return Err(PipelineError::Config(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() || self.work_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "output_dir and work_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn builtin_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.builtin_root = path.into();
        self
    }

    pub fn work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = path.into();
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the parallelism; values below 1 are raised to 1.
    pub fn max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n.max(1);
        self
    }

    pub fn escape_data(mut self, enabled: bool) -> Self {
        self.escape_data = enabled;
        self
    }

    pub fn keep_build_dirs(mut self, enabled: bool) -> Self {
        self.keep_build_dirs = enabled;
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = BuildConfig::new()
            .builtin_root("/opt/pause/templates")
            .output_dir("dist")
            .max_parallel(0)
            .escape_data(true);

        assert_eq!(config.builtin_root, PathBuf::from("/opt/pause/templates"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.max_parallel, 1);
        assert!(config.escape_data);
        assert!(!config.keep_build_dirs);
        assert_eq!(config.tools.tectonic, "tectonic");
    }

    #[test]
    fn test_from_file_partial() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pause.yaml");
        fs::write(
            &path,
            "output_dir: out\nmax_parallel: 4\ntools:\n  typst: /usr/local/bin/typst\n",
        )
        .unwrap();

        let config = BuildConfig::from_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_parallel, 4);
        assert_eq!(config.tools.typst, "/usr/local/bin/typst");
        assert_eq!(config.tools.gomplate, "gomplate");
        assert_eq!(config.builtin_root, PathBuf::from("templates"));
    }

    #[test]
    fn test_from_file_rejects_zero_parallelism() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pause.yaml");
        fs::write(&path, "max_parallel: 0\n").unwrap();

        let err = BuildConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
