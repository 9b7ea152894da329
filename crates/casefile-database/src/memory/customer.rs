//! In-memory customer store.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use casefile_core::{AppError, AppResult};
use casefile_entity::customer::{CreateCustomer, Customer};

use crate::store::CustomerStore;

/// Customers held in a concurrent map with a serial identifier.
#[derive(Debug, Clone)]
pub struct MemoryCustomerStore {
    customers: Arc<DashMap<i32, Customer>>,
    next_id: Arc<AtomicI32>,
}

impl MemoryCustomerStore {
    /// Create an empty store. Identifiers start at 1.
    pub fn new() -> Self {
        Self {
            customers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI32::new(1)),
        }
    }
}

impl Default for MemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        let customer = Customer {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: data.name.clone(),
            created_at: Utc::now(),
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, customer: &Customer) -> AppResult<Customer> {
        let mut entry = self
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", customer.id)))?;
        entry.value_mut().name = customer.name.clone();
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.customers.remove(&id).is_some())
    }

    async fn list(&self) -> AppResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(customers)
    }
}
