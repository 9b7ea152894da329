//! Customer lifecycle.

use std::sync::Arc;

use tracing::{info, warn};

use casefile_core::{AppError, AppResult};
use casefile_database::{CustomerStore, DocumentRecordStore};
use casefile_entity::customer::{CreateCustomer, Customer, MAX_CUSTOMER_NAME_LEN};
use casefile_storage::registry::contains_files;
use casefile_storage::{CustomerDirectory, CustomerDirectoryRegistry, DirectoryOutcome};

/// Creates, renames and deletes customers together with their directory.
#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
    documents: Arc<dyn DocumentRecordStore>,
    registry: CustomerDirectoryRegistry,
}

impl CustomerService {
    /// Creates a new customer service.
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        documents: Arc<dyn DocumentRecordStore>,
        registry: CustomerDirectoryRegistry,
    ) -> Self {
        Self {
            customers,
            documents,
            registry,
        }
    }

    /// All customers ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Customer>> {
        self.customers.list().await
    }

    /// Get a customer.
    pub async fn get(&self, id: i32) -> AppResult<Customer> {
        self.customers.get_by_id(id).await
    }

    /// Create a customer and its directory.
    pub async fn create(&self, name: &str) -> AppResult<(Customer, CustomerDirectory)> {
        let name = validate_name(name)?;
        let customer = self.customers.create(&CreateCustomer { name }).await?;
        let dir = self.registry.get_or_create(customer.id, &customer.name).await?;
        info!(customer_id = customer.id, dir = %dir.name, "Customer created");
        Ok((customer, dir))
    }

    /// Rename a customer and bring its directory name in line.
    ///
    /// When the directory moves, the stored path of every document record
    /// of the customer is rewritten to the new location. A directory
    /// conflict is reported in the returned outcome, not as an error.
    pub async fn rename(&self, id: i32, name: &str) -> AppResult<(Customer, DirectoryOutcome)> {
        let name = validate_name(name)?;
        let mut customer = self.customers.get_by_id(id).await?;
        let before = match self.registry.find_by_id(id).await? {
            Some(dir) => Some(self.registry.paths().to_stored_path(&dir).await?),
            None => None,
        };

        customer.name = name;
        let customer = self.customers.update(&customer).await?;

        let dir = self.registry.get_or_create(customer.id, &customer.name).await?;
        let after = self.registry.paths().to_stored_path(&dir.path).await?;
        let updated_documents = match before {
            Some(before) if before != after => {
                self.rebase_documents(id, &format!("{before}/"), &format!("{after}/"))
                    .await?
            }
            _ => 0,
        };

        if dir.outcome.is_conflict() {
            warn!(customer_id = id, dir = %dir.name, "Customer renamed but directory conflict remains");
        } else {
            info!(customer_id = id, dir = %dir.name, updated_documents, "Customer renamed");
        }
        Ok((customer, dir.outcome))
    }

    /// Delete a customer that holds no documents and no files.
    ///
    /// Empty folders do not block deletion and are removed with the
    /// customer directory.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let customer = self.customers.get_by_id(id).await?;

        if !self.documents.list_by_customer(id).await?.is_empty() {
            return Err(AppError::invalid_operation(format!(
                "Customer '{}' still has documents",
                customer.name
            )));
        }
        if let Some(dir) = self.registry.find_by_id(id).await? {
            if contains_files(&dir).await? {
                return Err(AppError::invalid_operation(format!(
                    "Customer '{}' still has files",
                    customer.name
                )));
            }
        }

        self.registry.remove(id).await?;
        self.customers.delete(id).await?;
        info!(customer_id = id, "Customer deleted");
        Ok(())
    }

    async fn rebase_documents(
        &self,
        customer_id: i32,
        old_prefix: &str,
        new_prefix: &str,
    ) -> AppResult<usize> {
        let mut updated = 0;
        for mut doc in self.documents.list_by_customer(customer_id).await? {
            let Some(rest) = doc.stored_path.strip_prefix(old_prefix) else {
                continue;
            };
            doc.stored_path = format!("{new_prefix}{rest}");
            self.documents.update(&doc).await?;
            updated += 1;
        }
        Ok(updated)
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_operation("Customer name must not be empty"));
    }
    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(AppError::invalid_operation(format!(
            "Customer name must be at most {MAX_CUSTOMER_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
