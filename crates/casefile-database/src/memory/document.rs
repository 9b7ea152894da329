//! In-memory document record store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use casefile_core::{AppError, AppResult};
use casefile_entity::document::DocumentItem;

use crate::store::DocumentRecordStore;

/// Document records held in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    records: Arc<DashMap<Uuid, DocumentItem>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl DocumentRecordStore for MemoryDocumentStore {
    async fn create(&self, item: &DocumentItem) -> AppResult<DocumentItem> {
        match self.records.entry(item.id) {
            Entry::Occupied(_) => Err(AppError::database(format!(
                "Document {} already exists",
                item.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(item.clone());
                Ok(item.clone())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DocumentItem>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, item: &DocumentItem) -> AppResult<DocumentItem> {
        let mut entry = self
            .records
            .get_mut(&item.id)
            .ok_or_else(|| AppError::not_found(format!("Document {} not found", item.id)))?;
        let record = entry.value_mut();
        record.folder_id = item.folder_id.clone();
        record.original_file_name = item.original_file_name.clone();
        record.stored_path = item.stored_path.clone();
        record.status = item.status;
        record.error_message = item.error_message.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    async fn list_by_customer(&self, customer_id: i32) -> AppResult<Vec<DocumentItem>> {
        let mut items: Vec<DocumentItem> = self
            .records
            .iter()
            .filter(|entry| entry.customer_id == customer_id)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }
}
