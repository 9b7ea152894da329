//! Document byte storage.
//!
//! Validates uploads, computes collision-free locations inside a customer
//! directory and reads or writes bytes addressed by project-root-relative
//! stored paths. Every stored path is re-checked against the project root
//! before it is touched.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use casefile_core::config::upload::UploadConfig;
use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::folder::{is_root_sentinel, normalize_rel_path};

use crate::naming::{file_name_of, sanitize_segment, unique_path};
use crate::paths::AppPaths;
use crate::registry::CustomerDirectoryRegistry;
use crate::sandbox::PathSandbox;
use crate::upload::UploadSource;

/// Name of the per-folder directory used by the dated layout.
pub const DATED_LAYOUT_DIR: &str = "Documents";

const OCTET_STREAM: &str = "application/octet-stream";

/// Where a document's bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLocation {
    /// Normalized folder identifier.
    pub folder_id: String,
    /// Absolute path of the bytes.
    pub absolute: PathBuf,
    /// Project-root-relative, slash-separated path.
    pub stored_path: String,
    /// File name of the bytes.
    pub file_name: String,
}

/// An opened stored document.
#[derive(Debug)]
pub struct StoredFile {
    /// Absolute path of the bytes.
    pub path: PathBuf,
    /// Size in bytes.
    pub len: u64,
    /// Byte stream over the file.
    pub stream: ReaderStream<fs::File>,
}

/// Validates, places and persists document bytes.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    paths: AppPaths,
    registry: CustomerDirectoryRegistry,
    config: UploadConfig,
}

impl DocumentStorage {
    /// Create a document storage service.
    pub fn new(paths: AppPaths, registry: CustomerDirectoryRegistry, config: UploadConfig) -> Self {
        Self {
            paths,
            registry,
            config,
        }
    }

    /// Upload settings.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Check an upload against the size, extension and content-type rules.
    pub fn validate_upload(&self, file: &dyn UploadSource) -> AppResult<()> {
        if file.is_empty() {
            return Err(AppError::unvalidated_upload("Empty file"));
        }
        if file.len() > self.config.max_upload_size_bytes {
            return Err(AppError::unvalidated_upload(format!(
                "File too large (max {} MB)",
                self.config.max_upload_size_bytes / (1024 * 1024)
            )));
        }

        let ext = extension_of(file.file_name()).unwrap_or_default();
        if !self
            .config
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        {
            return Err(AppError::unvalidated_upload(format!(
                "File type '{ext}' not allowed"
            )));
        }

        let content_type = file
            .content_type()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let allowed = self
            .config
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&content_type));
        let tolerated =
            self.config.allow_octet_stream_pdf && content_type == OCTET_STREAM && ext == ".pdf";
        if !allowed && !tolerated {
            return Err(AppError::unvalidated_upload(format!(
                "Content-Type '{content_type}' not allowed"
            )));
        }
        Ok(())
    }

    /// Normalize a folder identifier for storage.
    ///
    /// Empty and `"root"` map to the default folder. Segments made only of
    /// dots (`.`, `..`, `...`) are dropped and every other segment goes
    /// through [`sanitize_segment`], the same rule that names folders
    /// created on disk.
    pub fn normalize_folder_id(&self, raw: &str) -> String {
        if is_root_sentinel(raw) {
            return self.paths.default_folder().to_string();
        }

        let normalized = normalize_rel_path(raw)
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && !segment.chars().all(|c| c == '.'))
            .map(sanitize_segment)
            .collect::<Vec<_>>()
            .join("/");
        if normalized.is_empty() {
            self.paths.default_folder().to_string()
        } else {
            normalized
        }
    }

    /// Location under the dated layout:
    /// `<customerDir>/<folder>/Documents/<yyyy-MM-dd>/<documentId>/original<ext>`.
    pub async fn build_stored_path(
        &self,
        customer_id: i32,
        folder_id: &str,
        created_at: DateTime<Utc>,
        document_id: Uuid,
        extension: &str,
    ) -> AppResult<StoredLocation> {
        let folder_id = self.normalize_folder_id(folder_id);
        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let file_name = format!("original{}", extension.to_lowercase());
        let rel = format!(
            "{folder_id}/{DATED_LAYOUT_DIR}/{}/{}/{file_name}",
            created_at.format("%Y-%m-%d"),
            document_id.hyphenated()
        );
        let absolute = sandbox.resolve(&rel).await?;
        self.location(folder_id, absolute, file_name).await
    }

    /// Location directly in the folder, `<customerDir>/<folder>/<file name>`,
    /// with `_2`, `_3`, ... appended on collision.
    pub async fn build_stored_path_for_filename(
        &self,
        customer_id: i32,
        folder_id: &str,
        file_name: &str,
    ) -> AppResult<StoredLocation> {
        let folder_id = self.normalize_folder_id(folder_id);
        let sandbox = self.registry.sandbox_for(customer_id).await?;
        self.unique_location(&sandbox, folder_id, file_name).await
    }

    /// Collision-free location in an already normalized folder of `sandbox`.
    pub async fn unique_location(
        &self,
        sandbox: &PathSandbox,
        folder_id: String,
        file_name: &str,
    ) -> AppResult<StoredLocation> {
        let file_name = safe_file_name(file_name);
        let folder = sandbox.resolve(&folder_id).await?;
        let absolute = unique_path(&folder, &file_name).await?;
        // Re-check the final candidate: the probe may have stepped onto a link.
        let rel = format!("{folder_id}/{}", file_name_of(&absolute)?);
        let absolute = sandbox.resolve(&rel).await?;
        let file_name = file_name_of(&absolute)?;
        self.location(folder_id, absolute, file_name).await
    }

    async fn location(
        &self,
        folder_id: String,
        absolute: PathBuf,
        file_name: String,
    ) -> AppResult<StoredLocation> {
        let stored_path = self.paths.to_stored_path(&absolute).await?;
        Ok(StoredLocation {
            folder_id,
            absolute,
            stored_path,
            file_name,
        })
    }

    /// Absolute path for a stored path, checked against the project root.
    pub async fn absolute_from_relative(&self, stored_path: &str) -> AppResult<PathBuf> {
        let sandbox = self.paths.project_sandbox().await?;
        sandbox.resolve(stored_path).await
    }

    /// Write an upload to a stored path using exclusive create.
    ///
    /// Fails with `IoConflict` if the file already exists. A partially
    /// written file is removed on failure.
    pub async fn save_to_path(&self, stored_path: &str, source: &dyn UploadSource) -> AppResult<u64> {
        let abs = self.absolute_from_relative(stored_path).await?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AppError::with_source(
                        ErrorKind::IoConflict,
                        format!("File already exists: {stored_path}"),
                        e,
                    )
                } else {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to create file: {stored_path}"),
                        e,
                    )
                }
            })?;

        let written = async {
            let written = source.copy_to(&mut file).await?;
            file.flush()
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))?;
            Ok::<u64, AppError>(written)
        }
        .await;

        match written {
            Ok(bytes) => {
                debug!(stored_path, bytes, "Stored document bytes");
                Ok(bytes)
            }
            Err(e) => {
                drop(file);
                remove_file_best_effort(&abs).await;
                Err(e)
            }
        }
    }

    /// Open stored bytes for streaming.
    pub async fn open(&self, stored_path: &str) -> AppResult<StoredFile> {
        let path = self.absolute_from_relative(stored_path).await?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Stored file not found: {stored_path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {stored_path}"),
                    e,
                )
            }
        })?;
        let len = file
            .metadata()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to read metadata", e))?
            .len();
        Ok(StoredFile {
            path,
            len,
            stream: ReaderStream::new(file),
        })
    }

    /// Move stored bytes to a new absolute location in the project.
    pub async fn move_to(&self, stored_path: &str, target: &Path) -> AppResult<String> {
        let from = self.absolute_from_relative(stored_path).await?;
        let target_stored = self.paths.to_stored_path(target).await?;
        let to = self.absolute_from_relative(&target_stored).await?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::rename(&from, &to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move {stored_path} -> {target_stored}"),
                e,
            )
        })?;
        info!(from = stored_path, to = %target_stored, "Moved document bytes");
        Ok(target_stored)
    }

    /// Whether the stored bytes exist.
    pub async fn exists(&self, stored_path: &str) -> AppResult<bool> {
        let abs = self.absolute_from_relative(stored_path).await?;
        Ok(fs::metadata(&abs).await.map(|m| m.is_file()).unwrap_or(false))
    }

    /// Remove stored bytes, ignoring failures.
    ///
    /// When the bytes sat in their own dated-layout directory (named after
    /// `document_id`) that directory is removed too once empty.
    pub async fn remove_best_effort(&self, stored_path: &str, document_id: Uuid) {
        let abs = match self.absolute_from_relative(stored_path).await {
            Ok(abs) => abs,
            Err(e) => {
                debug!(stored_path, error = %e, "Skipping removal of unresolvable path");
                return;
            }
        };
        remove_file_best_effort(&abs).await;

        let Some(parent) = abs.parent() else { return };
        let own_dir = parent
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == document_id.hyphenated().to_string());
        if own_dir {
            if let Err(e) = fs::remove_dir(parent).await {
                debug!(path = %parent.display(), error = %e, "Kept document directory");
            }
        }
    }
}

/// Lowercase extension with leading dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => Some(name[idx..].to_lowercase()),
        _ => None,
    }
}

/// Final component of a client-supplied file name, sanitized.
pub fn safe_file_name(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    sanitize_segment(name)
}

/// Content type for serving a file, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some(".pdf") => "application/pdf",
        Some(".png") => "image/png",
        Some(".jpg") | Some(".jpeg") => "image/jpeg",
        Some(".gif") => "image/gif",
        Some(".webp") => "image/webp",
        Some(".tif") | Some(".tiff") => "image/tiff",
        Some(".txt") => "text/plain",
        Some(".md") => "text/markdown",
        Some(".json") => "application/json",
        _ => OCTET_STREAM,
    }
}

async fn remove_file_best_effort(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Could not remove file");
        }
    }
}
