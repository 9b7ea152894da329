//! Mapping from customer identifiers to customer directories.
//!
//! Each customer owns exactly one directory under the clients root named
//! `{id}_{sanitized-name}`. Lookups go by the `{id}_` prefix so a display
//! name change never orphans data: the directory is renamed, or reconciled
//! with a directory that already carries the new name. When both sides of
//! a rename hold data, the original directory is marked with
//! [`PRIMARY_MARKER`] so every later lookup keeps resolving to it.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use casefile_core::{AppError, AppResult, ErrorKind};

use crate::naming::{path_exists, sanitize_segment};
use crate::paths::AppPaths;
use crate::sandbox::PathSandbox;

/// File placed in the directory kept after a conflict.
pub const PRIMARY_MARKER: &str = ".casefile-primary";

/// What [`CustomerDirectoryRegistry::get_or_create`] had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// The directory already had the expected name.
    Existing,
    /// No directory existed; a new one was created.
    Created,
    /// The directory was renamed from an older name.
    Renamed {
        /// Previous location.
        from: PathBuf,
    },
    /// Two directories existed for the customer; the empty one was removed.
    Reconciled {
        /// Directory that was deleted.
        removed: PathBuf,
    },
    /// Two non-empty directories exist for the customer. The original is
    /// kept and nothing is deleted.
    Conflict {
        /// Directory carrying the expected name that was left untouched.
        conflicting: PathBuf,
    },
}

impl DirectoryOutcome {
    /// Whether the caller should surface a warning.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// A resolved customer directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDirectory {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Directory name.
    pub name: String,
    /// How the directory was obtained.
    pub outcome: DirectoryOutcome,
}

impl CustomerDirectory {
    /// Sandbox rooted at this directory.
    pub async fn sandbox(&self) -> AppResult<PathSandbox> {
        PathSandbox::new(&self.path).await
    }
}

/// Locates, creates and renames customer directories.
#[derive(Debug, Clone)]
pub struct CustomerDirectoryRegistry {
    paths: AppPaths,
}

impl CustomerDirectoryRegistry {
    /// Create a registry over the clients root of `paths`.
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    /// Project layout.
    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Directory name a customer should have.
    pub fn expected_name(customer_id: i32, name: &str) -> String {
        format!("{customer_id}_{}", sanitize_segment(name))
    }

    /// Find the customer's directory without creating anything.
    pub async fn find_by_id(&self, customer_id: i32) -> AppResult<Option<PathBuf>> {
        Ok(self.scan(customer_id).await?.into_iter().next())
    }

    /// Find the customer's directory, failing with `NotFound` if absent.
    pub async fn resolve_by_id(&self, customer_id: i32) -> AppResult<PathBuf> {
        self.find_by_id(customer_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Customer directory not found for id {customer_id}"))
        })
    }

    /// Sandbox over the customer's existing directory.
    pub async fn sandbox_for(&self, customer_id: i32) -> AppResult<PathSandbox> {
        let dir = self.resolve_by_id(customer_id).await?;
        PathSandbox::new(dir).await
    }

    /// Return the customer's directory, creating or renaming it so its name
    /// matches `name`. The default folder is created inside it.
    pub async fn get_or_create(&self, customer_id: i32, name: &str) -> AppResult<CustomerDirectory> {
        let expected_name = Self::expected_name(customer_id, name);
        let expected = self.paths.clients_root().join(&expected_name);
        let existing = self.scan(customer_id).await?;

        let stale = existing.iter().find(|dir| **dir != expected).cloned();
        let has_expected = existing.iter().any(|dir| *dir == expected);

        let (path, outcome) = match (stale, has_expected) {
            (None, true) => (expected, DirectoryOutcome::Existing),
            (None, false) => {
                create_dir(&expected).await?;
                info!(customer_id, path = %expected.display(), "Created customer directory");
                (expected, DirectoryOutcome::Created)
            }
            (Some(stale), false) => {
                rename_dir(&stale, &expected).await?;
                info!(
                    customer_id,
                    from = %stale.display(),
                    to = %expected.display(),
                    "Renamed customer directory"
                );
                (expected, DirectoryOutcome::Renamed { from: stale })
            }
            (Some(stale), true) => self.reconcile(customer_id, stale, expected).await?,
        };

        create_dir(&path.join(self.paths.default_folder())).await?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(expected_name);
        Ok(CustomerDirectory {
            path,
            name,
            outcome,
        })
    }

    /// Delete the customer's directory tree. Returns `false` if none existed.
    pub async fn remove(&self, customer_id: i32) -> AppResult<bool> {
        let Some(dir) = self.find_by_id(customer_id).await? else {
            return Ok(false);
        };
        fs::remove_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete customer directory: {}", dir.display()),
                e,
            )
        })?;
        info!(customer_id, path = %dir.display(), "Deleted customer directory");
        Ok(true)
    }

    async fn reconcile(
        &self,
        customer_id: i32,
        stale: PathBuf,
        expected: PathBuf,
    ) -> AppResult<(PathBuf, DirectoryOutcome)> {
        let stale_empty = is_dir_empty(&stale).await?;
        let expected_empty = is_dir_empty(&expected).await?;

        if stale_empty {
            remove_dir_best_effort(&stale).await;
            info!(customer_id, removed = %stale.display(), "Removed empty customer directory");
            return Ok((expected, DirectoryOutcome::Reconciled { removed: stale }));
        }
        if expected_empty {
            fs::remove_dir(&expected).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to remove {}", expected.display()),
                    e,
                )
            })?;
            rename_dir(&stale, &expected).await?;
            info!(customer_id, removed = %expected.display(), "Replaced empty customer directory");
            return Ok((
                expected.clone(),
                DirectoryOutcome::Reconciled { removed: expected },
            ));
        }

        mark_primary(&stale).await?;
        warn!(
            customer_id,
            kept = %stale.display(),
            conflicting = %expected.display(),
            "Two non-empty customer directories exist; keeping the original"
        );
        Ok((stale, DirectoryOutcome::Conflict { conflicting: expected }))
    }

    /// Directories under the clients root whose name starts with `{id}_`.
    /// A directory carrying [`PRIMARY_MARKER`] comes first, the rest follow
    /// by name.
    async fn scan(&self, customer_id: i32) -> AppResult<Vec<PathBuf>> {
        let prefix = format!("{customer_id}_");
        let root = self.paths.clients_root();
        let mut entries = fs::read_dir(root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list clients root: {}", root.display()),
                e,
            )
        })?;

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) {
                continue;
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                let path = entry.path();
                let primary = path_exists(&path.join(PRIMARY_MARKER)).await?;
                found.push((!primary, path));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }
}

/// Whether a directory has no entries.
pub async fn is_dir_empty(dir: &Path) -> AppResult<bool> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to list {}", dir.display()),
            e,
        )
    })?;
    let first = entries.next_entry().await.map_err(|e| {
        AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
    })?;
    Ok(first.is_none())
}

/// Whether any regular file exists anywhere beneath `dir`.
pub async fn contains_files(dir: &Path) -> AppResult<bool> {
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list {}", current.display()),
                    e,
                ));
            }
        };
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let file_type = entry.file_type().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read file type", e)
            })?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if entry.file_name() != PRIMARY_MARKER {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn create_dir(path: &Path) -> AppResult<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create directory: {}", path.display()),
            e,
        )
    })
}

async fn rename_dir(from: &Path, to: &Path) -> AppResult<()> {
    if path_exists(to).await? {
        return Err(AppError::io_conflict(format!(
            "Cannot rename {} to existing {}",
            from.display(),
            to.display()
        )));
    }
    fs::rename(from, to).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to rename {} -> {}", from.display(), to.display()),
            e,
        )
    })
}

async fn mark_primary(dir: &Path) -> AppResult<()> {
    fs::write(dir.join(PRIMARY_MARKER), b"").await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to mark {}", dir.display()),
            e,
        )
    })
}

async fn remove_dir_best_effort(path: &Path) {
    if let Err(e) = fs::remove_dir(path).await {
        debug!(path = %path.display(), error = %e, "Could not remove directory");
    }
}
