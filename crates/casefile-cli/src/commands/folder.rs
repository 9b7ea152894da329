//! Folder management CLI commands.

use clap::{Args, Subcommand};

use casefile_core::AppResult;

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Create a folder
    Create {
        /// Customer ID
        #[arg(short, long)]
        customer: i32,
        /// Folder name
        name: String,
        /// Parent folder path (omit for the customer root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Rename a folder and update the documents filed in it
    Rename {
        /// Customer ID
        #[arg(short, long)]
        customer: i32,
        /// Folder path
        path: String,
        /// New name
        name: String,
    },
    /// Delete a folder with its notes and documents
    Delete {
        /// Customer ID
        #[arg(short, long)]
        customer: i32,
        /// Folder path
        path: String,
    },
    /// Show the merged folder tree
    Tree {
        /// Customer ID (omit for all customers)
        #[arg(short, long)]
        customer: Option<i32>,
    },
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    ctx: &Context,
    format: OutputFormat,
    yes: bool,
) -> AppResult<()> {
    match &args.command {
        FolderCommand::Create {
            customer,
            name,
            parent,
        } => {
            let customer = ctx.customer(*customer).await?;
            let folder = ctx
                .notes()
                .create_folder(&customer, name, parent.as_deref())
                .await?;
            output::print_success(&format!("Folder '{folder}' created"));
        }
        FolderCommand::Rename {
            customer,
            path,
            name,
        } => {
            let renamed = ctx.folder_service().rename(*customer, path, name).await?;
            output::print_success(&format!(
                "Folder '{}' renamed to '{}' ({} documents updated)",
                renamed.from, renamed.to, renamed.updated_documents
            ));
        }
        FolderCommand::Delete { customer, path } => {
            let prompt = format!("Delete folder '{path}' with all notes and documents?");
            if !super::confirm(&prompt, yes)? {
                return Ok(());
            }
            let deletion = ctx.folder_service().delete(*customer, path).await?;
            if deletion.removed_directory || deletion.removed_documents > 0 {
                output::print_success(&format!(
                    "Folder '{path}' deleted ({} documents removed)",
                    deletion.removed_documents
                ));
            } else {
                output::print_warning(&format!("Nothing deleted for '{path}'"));
            }
        }
        FolderCommand::Tree { customer } => {
            let builder = ctx.tree_builder();
            let trees = match customer {
                Some(id) => vec![builder.build_for(*id).await?],
                None => builder.sidebar().await?,
            };
            output::print_trees(&trees, format);
        }
    }

    Ok(())
}
