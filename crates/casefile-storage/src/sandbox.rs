//! Customer-scoped path resolution with containment checks.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::folder::normalize_rel_path;

/// Resolves sandbox-relative paths beneath a fixed root directory.
///
/// Every resolved path is checked against the canonical root after
/// symbolic links are followed, so a link pointing outside the sandbox is
/// rejected like a `..` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Create a sandbox for an existing directory.
    pub async fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Sandbox root not found: {}", root.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to resolve sandbox root: {}", root.display()),
                    e,
                )
            }
        })?;
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path to an absolute path strictly inside the root.
    ///
    /// Fails with `OutOfBounds` when the path contains a `..` segment, is
    /// empty, or resolves outside the root. Nothing is created.
    pub async fn resolve(&self, rel_path: &str) -> AppResult<PathBuf> {
        let normalized = normalize_rel_path(rel_path);
        if normalized.split('/').any(|segment| segment == "..") {
            return Err(AppError::out_of_bounds(format!(
                "Path '{rel_path}' contains a parent segment"
            )));
        }
        if normalized.is_empty() {
            return Err(AppError::out_of_bounds("Path resolves to the sandbox root"));
        }

        let mut joined = self.root.clone();
        for segment in normalized.split('/') {
            joined.push(segment);
        }
        let resolved = canonicalize_lenient(&joined).await?;
        if !self.is_strictly_inside(&resolved) {
            return Err(AppError::out_of_bounds(format!(
                "Path '{rel_path}' escapes the sandbox"
            )));
        }
        Ok(joined)
    }

    /// Like [`PathSandbox::resolve`], but an empty path yields the root.
    pub async fn resolve_or_root(&self, rel_path: &str) -> AppResult<PathBuf> {
        if normalize_rel_path(rel_path).is_empty() {
            return Ok(self.root.clone());
        }
        self.resolve(rel_path).await
    }

    /// Map an absolute path back to a slash-separated relative path.
    pub async fn relativize(&self, abs_path: &Path) -> AppResult<String> {
        let resolved = canonicalize_lenient(abs_path).await?;
        if !self.is_strictly_inside(&resolved) {
            return Err(AppError::out_of_bounds(format!(
                "Path {} is outside the sandbox",
                abs_path.display()
            )));
        }
        let rest = resolved
            .strip_prefix(&self.root)
            .map_err(|_| AppError::out_of_bounds("Path is outside the sandbox"))?;
        Ok(path_to_slash(rest))
    }

    /// Whether a canonical path lies strictly beneath the root.
    fn is_strictly_inside(&self, resolved: &Path) -> bool {
        resolved != self.root && resolved.starts_with(&self.root)
    }
}

/// Canonicalize a path that may not exist yet.
///
/// The deepest existing ancestor is canonicalized (resolving symbolic
/// links) and the missing tail is appended unchanged.
pub async fn canonicalize_lenient(path: &Path) -> AppResult<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    loop {
        match fs::canonicalize(&existing).await {
            Ok(mut base) => {
                for part in tail.iter().rev() {
                    base.push(part);
                }
                return Ok(base);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("No existing ancestor for {}", path.display()),
                        e,
                    ));
                };
                tail.push(name);
                if !existing.pop() {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("No existing ancestor for {}", path.display()),
                        e,
                    ));
                }
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to resolve {}", path.display()),
                    e,
                ));
            }
        }
    }
}

/// Join the normal components of a relative path with `/`.
pub fn path_to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
