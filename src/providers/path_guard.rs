use std::path::{Component, Path, PathBuf};

use crate::errors::PathError;
use crate::models::transfer::ResolvedTarget;

/// Keeps download destinations beneath a single sandbox root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    sandbox_root: PathBuf,
}

impl PathGuard {
    pub fn new(sandbox_root: impl Into<PathBuf>) -> Self {
        PathGuard {
            sandbox_root: sandbox_root.into(),
        }
    }

    /// Resolves `relative_path` against the sandbox root and creates the
    /// destination's parent directories.
    ///
    /// Containment is checked on the canonical forms of both paths, compared
    /// segment by segment, before anything is created on disk.
    pub fn validate(&self, relative_path: &str) -> Result<ResolvedTarget, PathError> {
        let root = std::fs::canonicalize(&self.sandbox_root).map_err(|e| {
            PathError::ResolutionFailed {
                path: self.sandbox_root.clone(),
                source: e,
            }
        })?;

        let candidate = normalize_lexically(&root.join(relative_path));
        let resolved = canonicalize_existing_prefix(&candidate)?;

        if !resolved.starts_with(&root) {
            tracing::warn!(
                requested = relative_path,
                resolved = %resolved.display(),
                "rejected destination outside sandbox"
            );
            return Err(PathError::Traversal(resolved));
        }

        let exists = match std::fs::metadata(&resolved) {
            Ok(metadata) if metadata.is_dir() => return Err(PathError::NotAFile(resolved)),
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(PathError::ResolutionFailed {
                    path: resolved,
                    source: e,
                });
            }
        };

        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PathError::DirCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        Ok(ResolvedTarget {
            absolute_path: resolved,
            sandbox_root: root,
            exists,
        })
    }
}

/// Applies `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonicalizes the deepest ancestor of `path` that exists and re-appends
/// the components that do not exist yet.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, PathError> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match std::fs::symlink_metadata(existing) {
            Ok(_) => break,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(PathError::ResolutionFailed {
                        path: path.to_path_buf(),
                        source: e,
                    });
                };
                missing.push(name);
                existing = parent;
            }
            Err(e) => {
                return Err(PathError::ResolutionFailed {
                    path: existing.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    let mut resolved =
        std::fs::canonicalize(existing).map_err(|e| PathError::ResolutionFailed {
            path: existing.to_path_buf(),
            source: e,
        })?;
    resolved.extend(missing.into_iter().rev());
    Ok(resolved)
}
