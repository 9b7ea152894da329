//! Note management CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use casefile_core::{AppError, AppResult};
use casefile_entity::note::{DeltaDocument, NoteSummary};
use casefile_service::note::clean_delta_json;

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for note commands
#[derive(Debug, Args)]
pub struct NoteArgs {
    /// Customer ID
    #[arg(short, long)]
    pub customer: i32,

    /// Note subcommand
    #[command(subcommand)]
    pub command: NoteCommand,
}

/// Note subcommands
#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Create an empty note
    Create {
        /// Title
        #[arg(short, long)]
        title: Option<String>,
        /// Parent folder path (omit for the customer root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// List notes, most recently modified first
    List,
    /// Print a note
    Show {
        /// Note path
        path: String,
    },
    /// Replace a note's content
    Write {
        /// Note path
        path: String,
        /// Plain text content
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,
        /// Read content from a file; `.json` files are read as Delta
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Move a note into another folder
    Move {
        /// Note path
        path: String,
        /// Target folder path
        target: String,
    },
    /// Rename a note
    Rename {
        /// Note path
        path: String,
        /// New name
        name: String,
    },
    /// Delete a note
    Delete {
        /// Note path
        path: String,
    },
}

/// Note display row
#[derive(Debug, Serialize, Tabled)]
struct NoteRow {
    /// Title
    title: String,
    /// Path
    path: String,
    /// Updated at
    updated_at: String,
}

impl From<&NoteSummary> for NoteRow {
    fn from(note: &NoteSummary) -> Self {
        Self {
            title: note.title.clone(),
            path: note.rel_path.clone(),
            updated_at: output::timestamp(&note.updated_at),
        }
    }
}

/// Execute note commands
pub async fn execute(
    args: &NoteArgs,
    ctx: &Context,
    format: OutputFormat,
    yes: bool,
) -> AppResult<()> {
    let notes = ctx.notes();
    let customer_id = args.customer;

    match &args.command {
        NoteCommand::Create { title, parent } => {
            let customer = ctx.customer(customer_id).await?;
            let path = notes
                .create_note(&customer, title.as_deref(), parent.as_deref())
                .await?;
            output::print_success(&format!("Note '{path}' created"));
        }
        NoteCommand::List => {
            let summaries = notes.list_notes(customer_id).await?;
            match format {
                OutputFormat::Json => output::print_json(&summaries),
                OutputFormat::Table => {
                    let rows: Vec<NoteRow> = summaries.iter().map(NoteRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        NoteCommand::Show { path } => {
            let document = notes.load(customer_id, path).await?;
            match format {
                OutputFormat::Json => output::print_json(&document),
                OutputFormat::Table => print!("{}", document.plain_text()),
            }
        }
        NoteCommand::Write { path, text, file } => {
            let document = match (text, file) {
                (Some(text), _) => DeltaDocument::from_plain_text(text),
                (None, Some(file)) => read_document(file).await?,
                (None, None) => {
                    return Err(AppError::invalid_operation(
                        "Either --text or --file is required",
                    ));
                }
            };
            let saved = notes.save(customer_id, path, &document).await?;
            output::print_success(&format!("Note '{path}' saved ({} ops)", saved.ops.len()));
        }
        NoteCommand::Move { path, target } => {
            let moved = notes.move_note(customer_id, path, target).await?;
            output::print_success(&format!("Note moved to '{moved}'"));
        }
        NoteCommand::Rename { path, name } => {
            let renamed = notes.rename_note(customer_id, path, name).await?;
            output::print_success(&format!("Note renamed to '{renamed}'"));
        }
        NoteCommand::Delete { path } => {
            if !super::confirm(&format!("Delete note '{path}'?"), yes)? {
                return Ok(());
            }
            notes.delete_note(customer_id, path).await?;
            output::print_success(&format!("Note '{path}' deleted"));
        }
    }

    Ok(())
}

async fn read_document(path: &Path) -> AppResult<DeltaDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::not_found(format!("Failed to read {}: {e}", path.display())))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(clean_delta_json(&content))
    } else {
        Ok(DeltaDocument::from_plain_text(&content))
    }
}
