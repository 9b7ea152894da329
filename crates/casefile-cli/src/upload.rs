//! Uploads read from the local filesystem.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite};
use tokio::sync::Mutex;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_storage::UploadSource;
use casefile_storage::documents::content_type_for;

/// A local file offered for upload. The content type is derived from the
/// extension.
///
/// The file stays open from [`LocalFileUpload::open`] on, and at most the
/// length seen at open time is copied, so the size that passed validation
/// is the size that gets stored.
#[derive(Debug)]
pub struct LocalFileUpload {
    path: PathBuf,
    file: Mutex<fs::File>,
    file_name: String,
    content_type: &'static str,
    len: u64,
}

impl LocalFileUpload {
    /// Open a local file and read its size from the handle.
    pub async fn open(path: &Path) -> AppResult<Self> {
        let file = fs::File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open {}", path.display()),
                    e,
                )
            }
        })?;
        let metadata = file.metadata().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat {}", path.display()),
                e,
            )
        })?;
        if !metadata.is_file() {
            return Err(AppError::invalid_operation(format!(
                "Not a file: {}",
                path.display()
            )));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            content_type: content_type_for(&file_name),
            file_name,
            len: metadata.len(),
        })
    }
}

#[async_trait]
impl UploadSource for LocalFileUpload {
    fn len(&self) -> u64 {
        self.len
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    async fn copy_to(&self, dest: &mut (dyn AsyncWrite + Unpin + Send)) -> AppResult<u64> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(0)).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}", self.path.display()),
                e,
            )
        })?;
        let mut limited = (&mut *file).take(self.len);
        tokio::io::copy(&mut limited, dest)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write upload", e))
    }
}
