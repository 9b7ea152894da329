//! Document record repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::document::DocumentItem;

use crate::store::DocumentRecordStore;

/// Repository for `document_items` rows.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRecordStore for DocumentRepository {
    async fn create(&self, item: &DocumentItem) -> AppResult<DocumentItem> {
        sqlx::query_as::<_, DocumentItem>(
            "INSERT INTO document_items \
             (id, customer_id, folder_id, original_file_name, stored_path, created_at, status, error_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(item.id)
        .bind(item.customer_id)
        .bind(&item.folder_id)
        .bind(&item.original_file_name)
        .bind(&item.stored_path)
        .bind(item.created_at)
        .bind(item.status)
        .bind(&item.error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create document", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DocumentItem>> {
        sqlx::query_as::<_, DocumentItem>("SELECT * FROM document_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    async fn update(&self, item: &DocumentItem) -> AppResult<DocumentItem> {
        sqlx::query_as::<_, DocumentItem>(
            "UPDATE document_items SET folder_id = $2, original_file_name = $3, stored_path = $4, \
             status = $5, error_message = $6 WHERE id = $1 RETURNING *",
        )
        .bind(item.id)
        .bind(&item.folder_id)
        .bind(&item.original_file_name)
        .bind(&item.stored_path)
        .bind(item.status)
        .bind(&item.error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update document", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {} not found", item.id)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM document_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_customer(&self, customer_id: i32) -> AppResult<Vec<DocumentItem>> {
        sqlx::query_as::<_, DocumentItem>(
            "SELECT * FROM document_items WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list documents", e))
    }
}
