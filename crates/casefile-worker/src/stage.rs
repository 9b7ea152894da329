//! Pipeline stages.

use async_trait::async_trait;

use casefile_core::AppError;
use casefile_entity::document::{DocumentItem, DocumentStatus};
use casefile_storage::DocumentStorage;

/// Error from a pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Processing of this document failed; it is marked `Failed`.
    #[error("Processing failed: {0}")]
    Failed(String),

    /// Infrastructure error; the document status is left unchanged.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// One step of the document pipeline.
#[async_trait]
pub trait PipelineStage: Send + Sync + std::fmt::Debug {
    /// Stage name for logging.
    fn name(&self) -> &str;

    /// Status a document must have for this stage to act on it.
    fn accepts(&self) -> DocumentStatus;

    /// Process a document and return its next status.
    async fn process(&self, document: &DocumentItem) -> Result<DocumentStatus, StageError>;
}

/// Confirms the uploaded bytes are in place and advances
/// `Pending -> Stored`.
#[derive(Debug, Clone)]
pub struct StoreStage {
    storage: DocumentStorage,
}

impl StoreStage {
    /// Create the store stage.
    pub fn new(storage: DocumentStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PipelineStage for StoreStage {
    fn name(&self) -> &str {
        "store"
    }

    fn accepts(&self) -> DocumentStatus {
        DocumentStatus::Pending
    }

    async fn process(&self, document: &DocumentItem) -> Result<DocumentStatus, StageError> {
        match self.storage.exists(&document.stored_path).await {
            Ok(true) => Ok(DocumentStatus::Stored),
            Ok(false) => Err(StageError::Failed(format!(
                "Stored file missing: {}",
                document.stored_path
            ))),
            Err(e) if e.kind == casefile_core::ErrorKind::OutOfBounds => Err(StageError::Failed(
                format!("Stored path is invalid: {}", document.stored_path),
            )),
            Err(e) => Err(StageError::Internal(e)),
        }
    }
}
