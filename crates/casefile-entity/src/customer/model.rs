//! Customer entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Longest accepted customer display name, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 200;

/// A customer owning one directory of folders, notes and documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    /// Database-assigned identifier.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    /// Display name, already trimmed.
    pub name: String,
}
