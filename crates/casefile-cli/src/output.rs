//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use casefile_entity::tree::{CustomerTree, TreeNode};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{json}");
}

/// Print customer trees, indented in table mode
pub fn print_trees(trees: &[CustomerTree], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(trees),
        OutputFormat::Table => {
            for tree in trees {
                println!("{} (#{})", tree.customer_name, tree.customer_id);
                print_nodes(&tree.nodes, 1);
            }
        }
    }
}

fn print_nodes(nodes: &[TreeNode], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            TreeNode::Folder(folder) => {
                println!("{indent}├── {}/", folder.name);
                print_nodes(&folder.children, depth + 1);
            }
            TreeNode::Note(note) => println!("{indent}├── {} [note]", note.name),
            TreeNode::Document(doc) => {
                println!("{indent}├── {} [{}] {}", doc.name, doc.status, doc.id)
            }
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

/// Format a timestamp for table output
pub fn timestamp(value: &chrono::DateTime<chrono::Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}
