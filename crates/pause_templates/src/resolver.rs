//! Template resolution: maps a reference to a local template directory.
//!
//! Built-in references resolve to a directory under the built-in root
//! without touching the network. Everything else is shallow-cloned with
//! `gh repo clone` into the work directory, trying the `main` branch first
//! and the repository's default branch second.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use pause_runner::{ExecutionResult, Invocation, RunnerResult, ToolRunner};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{TemplateError, TemplateResult};
use crate::reference::{TemplateReference, BUILTIN_TEMPLATES};

/// How a remote template is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStrategy {
    /// Shallow clone of the `main` branch.
    MainBranch,
    /// Shallow clone of whatever branch the remote marks as default.
    DefaultBranch,
}

impl CloneStrategy {
    /// Strategy tried first.
    pub const PRIMARY: CloneStrategy = CloneStrategy::MainBranch;

    /// Arguments passed through to `git clone`.
    pub fn git_args(&self) -> &'static [&'static str] {
        match self {
            Self::MainBranch => &["--branch=main", "--depth=1"],
            Self::DefaultBranch => &["--depth=1"],
        }
    }

    /// Strategy to try when this one fails.
    pub fn fallback(&self) -> Option<CloneStrategy> {
        match self {
            Self::MainBranch => Some(Self::DefaultBranch),
            Self::DefaultBranch => None,
        }
    }
}

/// Whether a failed clone attempt is worth retrying with the fallback
/// strategy: the tool ran and exited non-zero (e.g. no `main` branch).
/// A tool that cannot be started will not do better on the second try.
pub fn should_fall_back(outcome: &RunnerResult<ExecutionResult>) -> bool {
    matches!(outcome, Ok(result) if !result.success())
}

/// Resolves template references to local directories.
pub struct TemplateResolver {
    builtin_root: PathBuf,
    work_dir: PathBuf,
    runner: Arc<dyn ToolRunner>,
    program: String,
}

impl TemplateResolver {
    /// Create a resolver cloning with `gh`.
    pub fn new(
        builtin_root: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            builtin_root: builtin_root.into(),
            work_dir: work_dir.into(),
            runner,
            program: "gh".to_string(),
        }
    }

    /// Use a different GitHub CLI executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn builtin_root(&self) -> &Path {
        &self.builtin_root
    }

    /// Resolve a reference to its template directory.
    pub async fn resolve(
        &self,
        reference: &TemplateReference,
        credential: Option<&str>,
    ) -> TemplateResult<PathBuf> {
        match reference.builtin_name() {
            Some(name) => self.resolve_builtin(name),
            None => self.clone_template(reference, credential).await,
        }
    }

    fn resolve_builtin(&self, name: &str) -> TemplateResult<PathBuf> {
        let path = self.builtin_root.join(name);
        if !is_plain_name(name) || !path.is_dir() {
            return Err(TemplateError::TemplateNotFound {
                name: name.to_string(),
                available: BUILTIN_TEMPLATES.join(", "),
            });
        }
        info!("Using built-in template: {}", name);
        Ok(path)
    }

    /// Fresh checkout path for a remote reference:
    /// `<work_dir>/checkout-<uuid>/<repo>`.
    ///
    /// Every call yields a new parent directory, so concurrent resolves of
    /// the same repository never share a checkout.
    pub fn checkout_path(&self, reference: &TemplateReference) -> TemplateResult<PathBuf> {
        let name = reference
            .repo_name()
            .ok_or_else(|| TemplateError::CloneFailure {
                url: reference.to_string(),
                message: "cannot derive a repository name".to_string(),
            })?;
        Ok(self
            .work_dir
            .join(format!("checkout-{}", Uuid::new_v4().simple()))
            .join(name))
    }

    /// Clone a remote template, falling back to the default branch.
    pub async fn clone_template(
        &self,
        reference: &TemplateReference,
        credential: Option<&str>,
    ) -> TemplateResult<PathBuf> {
        let local_path = self.checkout_path(reference)?;
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|e| TemplateError::io_at(parent, e))?;
        }

        info!("Cloning template: {}", reference.clone_target());

        let mut strategy = CloneStrategy::PRIMARY;
        loop {
            clear_checkout(&local_path)?;

            let invocation = self.clone_invocation(reference, &local_path, strategy, credential);
            let outcome = self.runner.run(&invocation).await;

            match &outcome {
                Ok(result) if result.success() => {
                    debug!("Cloned {} with {:?}", reference, strategy);
                    return Ok(local_path);
                }
                _ => {}
            }

            match strategy.fallback() {
                Some(next) if should_fall_back(&outcome) => {
                    info!("Main branch not found, falling back to default branch");
                    strategy = next;
                }
                _ => {
                    let message = match outcome {
                        Ok(result) => result.failure_summary(),
                        Err(e) => e.to_string(),
                    };
                    return Err(TemplateError::CloneFailure {
                        url: reference.to_string(),
                        message,
                    });
                }
            }
        }
    }

    fn clone_invocation(
        &self,
        reference: &TemplateReference,
        local_path: &Path,
        strategy: CloneStrategy,
        credential: Option<&str>,
    ) -> Invocation {
        let mut invocation = Invocation::new(&self.program)
            .args(["repo", "clone", reference.clone_target()])
            .path_arg(local_path)
            .arg("--")
            .args(strategy.git_args().iter().copied());
        if let Some(token) = credential.filter(|t| !t.is_empty()) {
            invocation = invocation.env("GH_TOKEN", token);
        }
        invocation
    }
}

// Built-in names must stay inside the built-in root.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

// A failed attempt may leave a partial checkout that would block the retry.
fn clear_checkout(path: &Path) -> TemplateResult<()> {
    if path.exists() {
        warn!("Removing partial checkout at {:?}", path);
        fs::remove_dir_all(path).map_err(|e| TemplateError::io_at(path, e))?;
    }
    Ok(())
}
