//! Upload sources.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use casefile_core::{AppError, AppResult, ErrorKind};

/// A file offered for upload.
///
/// Exposes the declared metadata used for validation and copies its bytes
/// into a destination writer.
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Length in bytes.
    fn len(&self) -> u64;

    /// Whether the upload has no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// File name as declared by the client.
    fn file_name(&self) -> &str;

    /// Content type as declared by the client.
    fn content_type(&self) -> &str;

    /// Copy all bytes into `dest`. Returns the number of bytes written.
    async fn copy_to(&self, dest: &mut (dyn AsyncWrite + Unpin + Send)) -> AppResult<u64>;
}

/// An upload held in memory.
#[derive(Debug, Clone)]
pub struct BytesUpload {
    file_name: String,
    content_type: String,
    data: Bytes,
}

impl BytesUpload {
    /// Create an in-memory upload.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl UploadSource for BytesUpload {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    async fn copy_to(&self, dest: &mut (dyn AsyncWrite + Unpin + Send)) -> AppResult<u64> {
        dest.write_all(&self.data)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write upload", e))?;
        Ok(self.data.len() as u64)
    }
}
