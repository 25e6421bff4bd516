//! Artifact relocation.
//!
//! Artifacts are moved from their build directory into the output
//! directory. A plain rename is tried first; when it fails (typically
//! because the two directories live on different filesystems) the file is
//! copied and the source removed.

use std::fs;
use std::io;
use std::path::Path;

use fs_extra::file::{move_file, CopyOptions};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// How an artifact reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationMethod {
    /// Atomic rename
    Renamed,
    /// Copy followed by removal of the source
    Copied,
}

/// Move `from` to `to`, replacing any existing file at `to`.
pub fn relocate(from: &Path, to: &Path) -> PipelineResult<RelocationMethod> {
    relocate_with(from, to, |a, b| fs::rename(a, b))
}

/// Like [`relocate`], with the atomic move supplied by the caller.
pub fn relocate_with<F>(from: &Path, to: &Path, atomic_move: F) -> PipelineResult<RelocationMethod>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let failure = |message: String| PipelineError::RelocationFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        message,
    };

    if !from.is_file() {
        return Err(failure("source artifact does not exist".to_string()));
    }
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
    }

    match atomic_move(from, to) {
        Ok(()) => Ok(RelocationMethod::Renamed),
        Err(e) => {
            debug!("Rename of {:?} failed ({}), copying instead", from, e);
            let mut options = CopyOptions::new();
            options.overwrite = true;
            move_file(from, to, &options).map_err(|e| failure(e.to_string()))?;
            Ok(RelocationMethod::Copied)
        }
    }
}
