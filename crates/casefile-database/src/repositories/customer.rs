//! Customer repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::customer::{CreateCustomer, Customer};

use crate::store::CustomerStore;

/// Repository for `customers` rows.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Create a new customer repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("INSERT INTO customers (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create customer", e))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find customer", e))
    }

    async fn update(&self, customer: &Customer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("UPDATE customers SET name = $2 WHERE id = $1 RETURNING *")
            .bind(customer.id)
            .bind(&customer.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update customer", e))?
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", customer.id)))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete customer", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> AppResult<Vec<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list customers", e))
    }
}
