//! Folder operations that cascade to document records.

use std::sync::Arc;

use tracing::{info, warn};

use casefile_core::AppResult;
use casefile_database::DocumentRecordStore;
use casefile_entity::document::DocumentItem;
use casefile_entity::folder::FolderPath;
use casefile_storage::CustomerDirectoryRegistry;

use crate::note::NoteStore;

/// Result of a folder deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderDeletion {
    /// Whether a directory was removed from disk.
    pub removed_directory: bool,
    /// Number of document records deleted.
    pub removed_documents: usize,
}

/// Result of a folder rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRename {
    /// Previous path.
    pub from: FolderPath,
    /// New path, after collision suffixing.
    pub to: FolderPath,
    /// Number of document records rewritten.
    pub updated_documents: usize,
}

/// Deletes and renames folders, keeping document records in step with
/// the directories they point into.
#[derive(Clone)]
pub struct FolderService {
    notes: NoteStore,
    registry: CustomerDirectoryRegistry,
    documents: Arc<dyn DocumentRecordStore>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        notes: NoteStore,
        registry: CustomerDirectoryRegistry,
        documents: Arc<dyn DocumentRecordStore>,
    ) -> Self {
        Self {
            notes,
            registry,
            documents,
        }
    }

    /// Delete a folder tree and every document record filed in it or below.
    ///
    /// The customer root and the default folder are left alone.
    pub async fn delete(&self, customer_id: i32, rel_path: &str) -> AppResult<FolderDeletion> {
        let folder = FolderPath::from_folder_id(rel_path)?;
        if folder.is_root() || self.notes.is_default_folder(&folder) {
            return Ok(FolderDeletion::default());
        }

        let removed_directory = self.notes.delete_folder_recursive(customer_id, folder.as_str()).await?;

        let mut removed_documents = 0;
        for doc in self.documents_within(customer_id, &folder).await? {
            if self.documents.delete(doc.id).await? {
                removed_documents += 1;
            }
        }

        info!(
            customer_id,
            folder = %folder,
            removed_directory,
            removed_documents,
            "Folder deleted with contents"
        );
        Ok(FolderDeletion {
            removed_directory,
            removed_documents,
        })
    }

    /// Rename a folder and rewrite the folder identifier and stored path of
    /// every document record beneath it.
    pub async fn rename(
        &self,
        customer_id: i32,
        rel_path: &str,
        new_name: &str,
    ) -> AppResult<FolderRename> {
        let from = FolderPath::from_folder_id(rel_path)?;
        let to = self.notes.rename_folder(customer_id, rel_path, new_name).await?;
        if from == to {
            return Ok(FolderRename {
                from,
                to,
                updated_documents: 0,
            });
        }

        let customer_dir = self.registry.resolve_by_id(customer_id).await?;
        let customer_prefix = self.registry.paths().to_stored_path(&customer_dir).await?;
        let old_prefix = format!("{customer_prefix}/{from}/");
        let new_prefix = format!("{customer_prefix}/{to}/");

        let mut updated_documents = 0;
        for mut doc in self.documents_within(customer_id, &from).await? {
            let Some(folder) = FolderPath::parse(&doc.folder_id)
                .ok()
                .and_then(|path| path.rebase(&from, &to))
            else {
                continue;
            };
            doc.folder_id = folder.to_string();
            match doc.stored_path.strip_prefix(&old_prefix) {
                Some(rest) => doc.stored_path = format!("{new_prefix}{rest}"),
                None => warn!(
                    customer_id,
                    document_id = %doc.id,
                    stored_path = %doc.stored_path,
                    "Document filed in renamed folder but stored elsewhere"
                ),
            }
            self.documents.update(&doc).await?;
            updated_documents += 1;
        }

        info!(customer_id, from = %from, to = %to, updated_documents, "Folder renamed with contents");
        Ok(FolderRename {
            from,
            to,
            updated_documents,
        })
    }

    async fn documents_within(
        &self,
        customer_id: i32,
        folder: &FolderPath,
    ) -> AppResult<Vec<DocumentItem>> {
        let docs = self.documents.list_by_customer(customer_id).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| {
                FolderPath::parse(&doc.folder_id)
                    .is_ok_and(|path| !path.is_root() && path.is_within(folder))
            })
            .collect())
    }
}
