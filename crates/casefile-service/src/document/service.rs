//! Document upload, rename, move, delete and download.

use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use casefile_core::config::upload::UploadLayout;
use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_database::DocumentRecordStore;
use casefile_entity::customer::Customer;
use casefile_entity::document::DocumentItem;
use casefile_storage::documents::{StoredFile, content_type_for, extension_of};
use casefile_storage::naming::file_name_of;
use casefile_storage::{CustomerDirectoryRegistry, DocumentStorage, PathSandbox, UploadSource};
use casefile_worker::PipelineQueue;

const FALLBACK_FILE_NAME: &str = "upload";
const FALLBACK_EXTENSION: &str = ".bin";

/// Outcome of one file in an upload batch.
#[derive(Debug)]
pub struct UploadResult {
    /// File name as declared by the client.
    pub file_name: String,
    /// The created record, or why the file was rejected.
    pub result: AppResult<DocumentItem>,
}

/// An opened document ready to be served.
#[derive(Debug)]
pub struct OpenedDocument {
    /// The record.
    pub document: DocumentItem,
    /// Name to offer for download.
    pub download_name: String,
    /// Content type by extension.
    pub content_type: &'static str,
    /// The stored bytes.
    pub file: StoredFile,
}

/// Handles the document lifecycle across storage, records and the
/// pipeline queue.
#[derive(Clone)]
pub struct DocumentService {
    storage: DocumentStorage,
    registry: CustomerDirectoryRegistry,
    documents: Arc<dyn DocumentRecordStore>,
    queue: PipelineQueue,
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        storage: DocumentStorage,
        registry: CustomerDirectoryRegistry,
        documents: Arc<dyn DocumentRecordStore>,
        queue: PipelineQueue,
    ) -> Self {
        Self {
            storage,
            registry,
            documents,
            queue,
        }
    }

    /// Upload a batch of files into a folder (the default folder when
    /// `folder_id` is absent or the root).
    ///
    /// Each file is validated, written, recorded as `Pending` and enqueued
    /// independently; a rejected file does not abort the batch.
    pub async fn upload(
        &self,
        customer: &Customer,
        folder_id: Option<&str>,
        files: &[&dyn UploadSource],
    ) -> AppResult<Vec<UploadResult>> {
        self.registry.get_or_create(customer.id, &customer.name).await?;
        let folder_id = self.storage.normalize_folder_id(folder_id.unwrap_or_default());

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let result = self.upload_one(customer.id, &folder_id, *file).await;
            if let Err(e) = &result {
                warn!(
                    customer_id = customer.id,
                    file_name = file.file_name(),
                    error = %e,
                    "Upload rejected"
                );
            }
            results.push(UploadResult {
                file_name: file.file_name().to_string(),
                result,
            });
        }
        Ok(results)
    }

    async fn upload_one(
        &self,
        customer_id: i32,
        folder_id: &str,
        file: &dyn UploadSource,
    ) -> AppResult<DocumentItem> {
        self.storage.validate_upload(file)?;

        let original_name = original_file_name(file.file_name());
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let location = match self.storage.config().layout {
            UploadLayout::Named => {
                self.storage
                    .build_stored_path_for_filename(customer_id, folder_id, &original_name)
                    .await?
            }
            UploadLayout::Dated => {
                let ext = extension_of(&original_name)
                    .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
                self.storage
                    .build_stored_path(customer_id, folder_id, created_at, id, &ext)
                    .await?
            }
        };

        let bytes = self.storage.save_to_path(&location.stored_path, file).await?;

        let record = DocumentItem::new_pending(
            id,
            customer_id,
            location.folder_id,
            original_name,
            location.stored_path,
            created_at,
        );
        let created = match self.documents.create(&record).await {
            Ok(created) => created,
            Err(e) => {
                self.storage.remove_best_effort(&record.stored_path, id).await;
                return Err(e);
            }
        };

        self.queue.enqueue(created.id);
        info!(
            customer_id,
            document_id = %created.id,
            stored_path = %created.stored_path,
            bytes,
            "Document uploaded"
        );
        Ok(created)
    }

    /// Get a document record.
    pub async fn get(&self, document_id: Uuid) -> AppResult<DocumentItem> {
        self.documents.get_by_id(document_id).await
    }

    /// Records of a customer, newest first.
    pub async fn list(&self, customer_id: i32) -> AppResult<Vec<DocumentItem>> {
        self.documents.list_by_customer(customer_id).await
    }

    /// Change the display filename. The stored bytes are not touched.
    ///
    /// Directory components are stripped and the old extension is kept
    /// when the new name has none.
    pub async fn rename(&self, document_id: Uuid, new_name: &str) -> AppResult<DocumentItem> {
        let name = new_name.trim().rsplit(['/', '\\']).next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(AppError::invalid_operation("New name must not be empty"));
        }

        let mut doc = self.documents.get_by_id(document_id).await?;
        let name = match (extension_of(name), doc.extension()) {
            (None, Some(old_ext)) => format!("{name}{old_ext}"),
            _ => name.to_string(),
        };
        doc.rename(&name);
        let updated = self.documents.update(&doc).await?;
        info!(document_id = %document_id, name = %updated.original_file_name, "Document renamed");
        Ok(updated)
    }

    /// Move a document into another folder of its customer.
    ///
    /// Empty and `"root"` targets mean the default folder, as does any
    /// target that would escape the customer directory. The target folder
    /// is created when missing. Moving into the current folder is a no-op.
    pub async fn move_document(
        &self,
        customer_id: i32,
        document_id: Uuid,
        target_folder: &str,
    ) -> AppResult<DocumentItem> {
        let mut doc = self.documents.get_by_id(document_id).await?;
        if doc.customer_id != customer_id {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found for customer {customer_id}"
            )));
        }

        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let target = self.target_folder(&sandbox, target_folder).await?;
        if target == self.storage.normalize_folder_id(&doc.folder_id) {
            debug!(document_id = %document_id, folder = %target, "Document already in folder");
            return Ok(doc);
        }

        let name = self.move_file_name(&doc);
        let location = self.storage.unique_location(&sandbox, target, &name).await?;

        let old_stored = doc.stored_path.clone();
        if self.storage.exists(&old_stored).await? {
            self.storage.move_to(&old_stored, &location.absolute).await?;
            self.storage.remove_best_effort(&old_stored, doc.id).await;
        } else {
            warn!(document_id = %document_id, stored_path = %old_stored, "Stored file missing; updating record only");
        }

        doc.folder_id = location.folder_id;
        doc.stored_path = location.stored_path;
        let updated = self.documents.update(&doc).await?;
        info!(
            customer_id,
            document_id = %document_id,
            folder = %updated.folder_id,
            stored_path = %updated.stored_path,
            "Document moved"
        );
        Ok(updated)
    }

    /// Delete a document: its bytes best-effort, then its record.
    pub async fn delete(&self, document_id: Uuid) -> AppResult<()> {
        let doc = self.documents.get_by_id(document_id).await?;
        self.storage.remove_best_effort(&doc.stored_path, doc.id).await;
        self.documents.delete(doc.id).await?;
        info!(document_id = %document_id, "Document deleted");
        Ok(())
    }

    /// Open the stored bytes of a document.
    pub async fn open(&self, document_id: Uuid) -> AppResult<OpenedDocument> {
        let document = self.documents.get_by_id(document_id).await?;
        let file = self.storage.open(&document.stored_path).await?;
        let download_name = if document.original_file_name.trim().is_empty() {
            file_name_of(&file.path)?
        } else {
            document.original_file_name.clone()
        };
        Ok(OpenedDocument {
            content_type: content_type_for(&download_name),
            download_name,
            document,
            file,
        })
    }

    /// Normalized, existing target folder; escaping targets fall back to
    /// the default folder.
    async fn target_folder(&self, sandbox: &PathSandbox, raw: &str) -> AppResult<String> {
        let default_folder = self.registry.paths().default_folder().to_string();
        let normalized = self.storage.normalize_folder_id(raw);

        let abs = match sandbox.resolve(&normalized).await {
            Ok(abs) => abs,
            Err(e) if e.kind == ErrorKind::OutOfBounds => {
                debug!(target = raw, "Target folder escapes the sandbox; using default folder");
                return self.ensure_folder(sandbox, default_folder).await;
            }
            Err(e) => return Err(e),
        };
        match fs::create_dir_all(&abs).await {
            Ok(()) => Ok(normalized),
            Err(e) => {
                debug!(target = raw, error = %e, "Cannot create target folder; using default folder");
                self.ensure_folder(sandbox, default_folder).await
            }
        }
    }

    async fn ensure_folder(&self, sandbox: &PathSandbox, folder: String) -> AppResult<String> {
        let abs = sandbox.resolve(&folder).await?;
        fs::create_dir_all(&abs).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create folder '{folder}'"),
                e,
            )
        })?;
        Ok(folder)
    }

    /// File name to use at the move destination.
    fn move_file_name(&self, doc: &DocumentItem) -> String {
        let original = doc.original_file_name.trim();
        if !original.is_empty() {
            return original.to_string();
        }
        let stored = doc.stored_path.rsplit('/').next().unwrap_or_default();
        if stored.is_empty() {
            format!("{FALLBACK_FILE_NAME}.pdf")
        } else {
            stored.to_string()
        }
    }
}

/// Final path component of a client-supplied name.
fn original_file_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name.to_string()
    }
}
