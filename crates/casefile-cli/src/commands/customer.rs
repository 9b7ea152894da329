//! Customer management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use casefile_core::AppResult;
use casefile_entity::customer::Customer;
use casefile_storage::DirectoryOutcome;

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for customer commands
#[derive(Debug, Args)]
pub struct CustomerArgs {
    /// Customer subcommand
    #[command(subcommand)]
    pub command: CustomerCommand,
}

/// Customer subcommands
#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// List all customers
    List,
    /// Create a customer and its directory
    Create {
        /// Display name
        name: String,
    },
    /// Rename a customer and its directory
    Rename {
        /// Customer ID
        id: i32,
        /// New display name
        name: String,
    },
    /// Delete a customer without documents or files
    Delete {
        /// Customer ID
        id: i32,
    },
}

/// Customer display row
#[derive(Debug, Serialize, Tabled)]
struct CustomerRow {
    /// Customer ID
    id: i32,
    /// Name
    name: String,
    /// Created at
    created_at: String,
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            created_at: output::timestamp(&customer.created_at),
        }
    }
}

/// Execute customer commands
pub async fn execute(
    args: &CustomerArgs,
    ctx: &Context,
    format: OutputFormat,
    yes: bool,
) -> AppResult<()> {
    let service = ctx.customer_service();

    match &args.command {
        CustomerCommand::List => {
            let customers = service.list().await?;
            let rows: Vec<CustomerRow> = customers.iter().map(CustomerRow::from).collect();
            output::print_list(&rows, format);
        }
        CustomerCommand::Create { name } => {
            let (customer, dir) = service.create(name).await?;
            output::print_success(&format!(
                "Customer '{}' created (id: {}, directory: {})",
                customer.name, customer.id, dir.name
            ));
        }
        CustomerCommand::Rename { id, name } => {
            let (customer, outcome) = service.rename(*id, name).await?;
            output::print_success(&format!("Customer {} renamed to '{}'", id, customer.name));
            match outcome {
                DirectoryOutcome::Renamed { from } => {
                    output::print_kv("Directory moved from", &from.display().to_string())
                }
                DirectoryOutcome::Reconciled { removed } => {
                    output::print_kv("Removed empty directory", &removed.display().to_string())
                }
                DirectoryOutcome::Conflict { conflicting } => output::print_warning(&format!(
                    "Directory {} already exists and is not empty; kept the original directory",
                    conflicting.display()
                )),
                DirectoryOutcome::Existing | DirectoryOutcome::Created => {}
            }
        }
        CustomerCommand::Delete { id } => {
            let customer = service.get(*id).await?;
            if !super::confirm(&format!("Delete customer '{}'?", customer.name), yes)? {
                return Ok(());
            }
            service.delete(*id).await?;
            output::print_success(&format!("Customer '{}' deleted", customer.name));
        }
    }

    Ok(())
}
