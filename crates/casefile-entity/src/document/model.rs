//! Document record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::DocumentStatus;

/// Column limit for [`DocumentItem::original_file_name`].
pub const MAX_ORIGINAL_FILE_NAME_LEN: usize = 255;
/// Column limit for [`DocumentItem::stored_path`].
pub const MAX_STORED_PATH_LEN: usize = 1024;
/// Column limit for [`DocumentItem::error_message`].
pub const MAX_ERROR_MESSAGE_LEN: usize = 1024;

/// An uploaded document tracked in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentItem {
    /// Unique document identifier.
    pub id: Uuid,
    /// Owning customer.
    pub customer_id: i32,
    /// Sandbox-relative folder identifier.
    pub folder_id: String,
    /// Filename as uploaded or last renamed.
    pub original_file_name: String,
    /// Project-root-relative path of the stored bytes, slash-separated.
    pub stored_path: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Pipeline status.
    pub status: DocumentStatus,
    /// Last processing error.
    pub error_message: Option<String>,
}

impl DocumentItem {
    /// Build a new `Pending` record.
    pub fn new_pending(
        id: Uuid,
        customer_id: i32,
        folder_id: impl Into<String>,
        original_file_name: impl Into<String>,
        stored_path: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            folder_id: folder_id.into(),
            original_file_name: truncate_chars(&original_file_name.into(), MAX_ORIGINAL_FILE_NAME_LEN),
            stored_path: stored_path.into(),
            created_at,
            status: DocumentStatus::Pending,
            error_message: None,
        }
    }

    /// Replace the original filename, truncated to the column limit.
    pub fn rename(&mut self, original_file_name: &str) {
        self.original_file_name = truncate_chars(original_file_name, MAX_ORIGINAL_FILE_NAME_LEN);
    }

    /// Record a processing failure, truncated to the column limit.
    pub fn fail(&mut self, message: &str) {
        self.status = DocumentStatus::Failed;
        self.error_message = Some(truncate_chars(message, MAX_ERROR_MESSAGE_LEN));
    }

    /// Extension of the original filename, lowercase with leading dot.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.original_file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_lowercase()))
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
