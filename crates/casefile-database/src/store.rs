//! Record-store traits.
//!
//! Services and the pipeline worker depend on these traits only, so the
//! PostgreSQL repositories and the in-memory stores are interchangeable.

use async_trait::async_trait;
use uuid::Uuid;

use casefile_core::{AppError, AppResult};
use casefile_entity::customer::{CreateCustomer, Customer};
use casefile_entity::document::DocumentItem;

/// Persistence of document records.
#[async_trait]
pub trait DocumentRecordStore: Send + Sync + 'static {
    /// Insert a new record and return it as stored.
    async fn create(&self, item: &DocumentItem) -> AppResult<DocumentItem>;

    /// Find a record by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DocumentItem>>;

    /// Replace all mutable fields of an existing record. Fails with
    /// `NotFound` if the record does not exist.
    async fn update(&self, item: &DocumentItem) -> AppResult<DocumentItem>;

    /// Delete a record. Returns `true` if a record was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// All records of a customer, newest first.
    async fn list_by_customer(&self, customer_id: i32) -> AppResult<Vec<DocumentItem>>;

    /// Find a record by ID, failing with `NotFound` when absent.
    async fn get_by_id(&self, id: Uuid) -> AppResult<DocumentItem> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }
}

/// Persistence of customers.
#[async_trait]
pub trait CustomerStore: Send + Sync + 'static {
    /// Insert a new customer; the store assigns the identifier.
    async fn create(&self, data: &CreateCustomer) -> AppResult<Customer>;

    /// Find a customer by ID.
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Customer>>;

    /// Update the display name of an existing customer.
    async fn update(&self, customer: &Customer) -> AppResult<Customer>;

    /// Delete a customer. Returns `true` if a customer was removed.
    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// All customers ordered by name.
    async fn list(&self) -> AppResult<Vec<Customer>>;

    /// Find a customer by ID, failing with `NotFound` when absent.
    async fn get_by_id(&self, id: i32) -> AppResult<Customer> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {id} not found")))
    }
}
