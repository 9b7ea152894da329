//! CLI command definitions and dispatch.

pub mod customer;
pub mod document;
pub mod folder;
pub mod migrate;
pub mod note;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use casefile_core::config::AppConfig;
use casefile_core::{AppError, AppResult};
use casefile_database::repositories::{CustomerRepository, DocumentRepository};
use casefile_database::{CustomerStore, DatabasePool, DocumentRecordStore};
use casefile_entity::customer::Customer;
use casefile_service::{CustomerService, FolderService, NoteStore, TreeBuilder};
use casefile_storage::{AppPaths, CustomerDirectoryRegistry, DocumentStorage};

use crate::output::OutputFormat;

/// Casefile: customer notes and documents on disk, indexed in PostgreSQL
#[derive(Debug, Parser)]
#[command(name = "casefile", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Customer management
    Customer(customer::CustomerArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// Note management
    Note(note::NoteArgs),
    /// Document management
    Document(document::DocumentArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let ctx = Context::connect(&self.config).await?;
        match &self.command {
            Commands::Migrate => migrate::execute(&ctx).await,
            Commands::Customer(args) => customer::execute(args, &ctx, self.format, self.yes).await,
            Commands::Folder(args) => folder::execute(args, &ctx, self.format, self.yes).await,
            Commands::Note(args) => note::execute(args, &ctx, self.format, self.yes).await,
            Commands::Document(args) => document::execute(args, &ctx, self.format, self.yes).await,
        }
    }
}

/// Shared wiring for every command.
pub struct Context {
    pub config: AppConfig,
    pub pool: DatabasePool,
    pub customers: Arc<dyn CustomerStore>,
    pub documents: Arc<dyn DocumentRecordStore>,
    pub paths: AppPaths,
    pub registry: CustomerDirectoryRegistry,
}

impl Context {
    /// Load configuration, connect to the database and prepare the
    /// project directories.
    pub async fn connect(config_path: &str) -> AppResult<Self> {
        let config = AppConfig::load_from(config_path)?;
        let pool = DatabasePool::connect(&config.database, "casefile-cli").await?;
        let paths = AppPaths::prepare(&config.storage).await?;
        let registry = CustomerDirectoryRegistry::new(paths.clone());
        Ok(Self {
            customers: Arc::new(CustomerRepository::new(pool.pool().clone())),
            documents: Arc::new(DocumentRepository::new(pool.pool().clone())),
            config,
            pool,
            paths,
            registry,
        })
    }

    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(
            self.customers.clone(),
            self.documents.clone(),
            self.registry.clone(),
        )
    }

    pub fn notes(&self) -> NoteStore {
        NoteStore::new(self.registry.clone())
    }

    pub fn folder_service(&self) -> FolderService {
        FolderService::new(self.notes(), self.registry.clone(), self.documents.clone())
    }

    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new(
            self.registry.clone(),
            self.customers.clone(),
            self.documents.clone(),
        )
    }

    pub fn storage(&self) -> DocumentStorage {
        DocumentStorage::new(
            self.paths.clone(),
            self.registry.clone(),
            self.config.upload.clone(),
        )
    }

    /// Look up a customer by identifier.
    pub async fn customer(&self, id: i32) -> AppResult<Customer> {
        self.customers.get_by_id(id).await
    }
}

/// Ask for confirmation unless `yes` was given.
pub fn confirm(prompt: &str, yes: bool) -> AppResult<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
    if !confirmed {
        println!("Cancelled.");
    }
    Ok(confirmed)
}
