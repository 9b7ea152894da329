//! Project directory layout.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use casefile_core::config::storage::StorageConfig;
use casefile_core::{AppError, AppResult, ErrorKind};

use crate::sandbox::{PathSandbox, canonicalize_lenient, path_to_slash};

/// Resolved locations of the project root, data directory and clients root.
#[derive(Debug, Clone)]
pub struct AppPaths {
    project_root: PathBuf,
    data_root: PathBuf,
    clients_root: PathBuf,
    default_folder: String,
}

impl AppPaths {
    /// Create the data and clients directories if needed and resolve them.
    pub async fn prepare(config: &StorageConfig) -> AppResult<Self> {
        let project_root = Path::new(&config.project_root);
        fs::create_dir_all(project_root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create project root: {}", project_root.display()),
                e,
            )
        })?;
        let project_root = fs::canonicalize(project_root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve project root: {}", project_root.display()),
                e,
            )
        })?;

        let data_root = project_root.join(&config.data_dir);
        let clients_root = data_root.join(&config.clients_dir);
        fs::create_dir_all(&clients_root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create clients root: {}", clients_root.display()),
                e,
            )
        })?;

        info!(
            project_root = %project_root.display(),
            clients_root = %clients_root.display(),
            "Storage layout ready"
        );

        Ok(Self {
            project_root,
            data_root,
            clients_root,
            default_folder: config.default_folder.clone(),
        })
    }

    /// Canonical project root. Stored document paths are relative to it.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Data directory under the project root.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory holding one subdirectory per customer.
    pub fn clients_root(&self) -> &Path {
        &self.clients_root
    }

    /// Name of the reserved default folder.
    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    /// Sandbox over the whole project root.
    pub async fn project_sandbox(&self) -> AppResult<PathSandbox> {
        PathSandbox::new(&self.project_root).await
    }

    /// Project-root-relative, slash-separated form of an absolute path.
    pub async fn to_stored_path(&self, abs_path: &Path) -> AppResult<String> {
        let resolved = canonicalize_lenient(abs_path).await?;
        let rest = resolved.strip_prefix(&self.project_root).map_err(|_| {
            AppError::out_of_bounds(format!(
                "Path {} is outside the project root",
                abs_path.display()
            ))
        })?;
        Ok(path_to_slash(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> StorageConfig {
        StorageConfig {
            project_root: root.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::prepare(&config(dir.path())).await.unwrap();

        assert!(paths.clients_root().is_dir());
        assert!(paths.clients_root().ends_with("Data/Clients"));
        assert_eq!(paths.default_folder(), "Dokumente");
    }

    #[tokio::test]
    async fn test_to_stored_path_is_slash_separated() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::prepare(&config(dir.path())).await.unwrap();

        let abs = paths.clients_root().join("1_A").join("Dokumente").join("a.pdf");
        let stored = paths.to_stored_path(&abs).await.unwrap();
        assert_eq!(stored, "Data/Clients/1_A/Dokumente/a.pdf");

        let outside = dir.path().parent().unwrap().join("elsewhere.pdf");
        assert!(paths.to_stored_path(&outside).await.is_err());
    }
}
