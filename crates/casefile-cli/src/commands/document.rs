//! Document management CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::document::DocumentItem;
use casefile_service::DocumentService;
use casefile_storage::UploadSource;
use casefile_worker::{PipelineWorker, StoreStage, pipeline_channel};

use super::Context;
use crate::output::{self, OutputFormat};
use crate::upload::LocalFileUpload;

/// Arguments for document commands
#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// Document subcommand
    #[command(subcommand)]
    pub command: DocumentCommand,
}

/// Document subcommands
#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Upload files and run the pipeline on them
    Upload {
        /// Customer ID
        #[arg(short, long)]
        customer: i32,
        /// Target folder path (omit for the default folder)
        #[arg(long)]
        folder: Option<String>,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List a customer's documents, newest first
    List {
        /// Customer ID
        #[arg(short, long)]
        customer: i32,
    },
    /// Rename a document
    Rename {
        /// Document ID
        id: Uuid,
        /// New file name
        name: String,
    },
    /// Move a document into another folder
    Move {
        /// Document ID
        id: Uuid,
        /// Target folder path
        target: String,
    },
    /// Delete a document and its stored file
    Delete {
        /// Document ID
        id: Uuid,
    },
    /// Show where a document is stored, or copy it out
    Open {
        /// Document ID
        id: Uuid,
        /// Copy the stored bytes to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Document display row
#[derive(Debug, Serialize, Tabled)]
struct DocumentRow {
    /// Document ID
    id: String,
    /// File name
    name: String,
    /// Folder
    folder: String,
    /// Status
    status: String,
    /// Created at
    created_at: String,
    /// Error
    error: String,
}

impl From<&DocumentItem> for DocumentRow {
    fn from(doc: &DocumentItem) -> Self {
        Self {
            id: doc.id.to_string(),
            name: doc.original_file_name.clone(),
            folder: doc.folder_id.clone(),
            status: doc.status.to_string(),
            created_at: output::timestamp(&doc.created_at),
            error: doc.error_message.clone().unwrap_or_default(),
        }
    }
}

/// Upload outcome row
#[derive(Debug, Serialize, Tabled)]
struct UploadRow {
    /// File name
    file: String,
    /// Document ID
    id: String,
    /// Result
    result: String,
}

/// Execute document commands
pub async fn execute(
    args: &DocumentArgs,
    ctx: &Context,
    format: OutputFormat,
    yes: bool,
) -> AppResult<()> {
    let storage = ctx.storage();
    let (queue, mut receiver) = pipeline_channel();
    let service = DocumentService::new(
        storage.clone(),
        ctx.registry.clone(),
        ctx.documents.clone(),
        queue,
    );

    match &args.command {
        DocumentCommand::Upload {
            customer,
            folder,
            files,
        } => {
            let customer = ctx.customer(*customer).await?;
            let mut sources = Vec::with_capacity(files.len());
            for path in files {
                sources.push(LocalFileUpload::open(path).await?);
            }
            let refs: Vec<&dyn UploadSource> =
                sources.iter().map(|s| s as &dyn UploadSource).collect();

            let results = service.upload(&customer, folder.as_deref(), &refs).await?;

            let worker = PipelineWorker::new(
                ctx.documents.clone(),
                Arc::new(StoreStage::new(storage.clone())),
            );
            let processed = worker.drain(&mut receiver).await;

            let mut rows = Vec::with_capacity(results.len());
            for upload in results {
                let row = match upload.result {
                    Ok(doc) => {
                        let doc = service.get(doc.id).await.unwrap_or(doc);
                        UploadRow {
                            file: upload.file_name,
                            id: doc.id.to_string(),
                            result: doc.status.to_string(),
                        }
                    }
                    Err(e) => UploadRow {
                        file: upload.file_name,
                        id: String::new(),
                        result: e.message,
                    },
                };
                rows.push(row);
            }
            output::print_list(&rows, format);
            tracing::debug!(processed, "Pipeline drained");
        }
        DocumentCommand::List { customer } => {
            let documents = service.list(*customer).await?;
            match format {
                OutputFormat::Json => output::print_json(&documents),
                OutputFormat::Table => {
                    let rows: Vec<DocumentRow> = documents.iter().map(DocumentRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        DocumentCommand::Rename { id, name } => {
            let doc = service.rename(*id, name).await?;
            output::print_success(&format!("Document renamed to '{}'", doc.original_file_name));
        }
        DocumentCommand::Move { id, target } => {
            let doc = service.get(*id).await?;
            let moved = service.move_document(doc.customer_id, doc.id, target).await?;
            output::print_success(&format!(
                "Document '{}' moved to '{}'",
                moved.original_file_name, moved.folder_id
            ));
        }
        DocumentCommand::Delete { id } => {
            let doc = service.get(*id).await?;
            let prompt = format!("Delete document '{}'?", doc.original_file_name);
            if !super::confirm(&prompt, yes)? {
                return Ok(());
            }
            service.delete(doc.id).await?;
            output::print_success(&format!("Document '{}' deleted", doc.original_file_name));
        }
        DocumentCommand::Open { id, output: target } => {
            let opened = service.open(*id).await?;
            match target {
                Some(target) => {
                    let copied = tokio::fs::copy(&opened.file.path, target).await.map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Storage,
                            format!("Failed to copy to {}", target.display()),
                            e,
                        )
                    })?;
                    output::print_success(&format!(
                        "'{}' written to {} ({copied} bytes)",
                        opened.download_name,
                        target.display()
                    ));
                }
                None => {
                    output::print_kv("Name", &opened.download_name);
                    output::print_kv("Content type", opened.content_type);
                    output::print_kv("Size", &format!("{} bytes", opened.file.len));
                    output::print_kv("Path", &opened.file.path.display().to_string());
                    output::print_kv("Status", opened.document.status.as_str());
                }
            }
        }
    }

    Ok(())
}
