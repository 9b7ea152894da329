//! Tree node structures for hierarchical display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocumentItem, DocumentStatus};
use crate::folder::FolderPath;
use crate::note::NoteKind;

/// A node in a customer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// A directory on disk.
    Folder(FolderNode),
    /// A note file on disk.
    Note(NoteLeaf),
    /// A document record placed by its folder identifier.
    Document(DocumentLeaf),
}

impl TreeNode {
    /// Label shown for the node.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::Note(note) => &note.name,
            Self::Document(document) => &document.name,
        }
    }
}

/// A folder and its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Directory name.
    pub name: String,
    /// Sandbox-relative path.
    pub path: FolderPath,
    /// Child folders, then notes, then documents.
    pub children: Vec<TreeNode>,
}

impl FolderNode {
    /// Empty folder node.
    pub fn new(name: impl Into<String>, path: FolderPath) -> Self {
        Self {
            name: name.into(),
            path,
            children: Vec::new(),
        }
    }
}

/// A note file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLeaf {
    /// Display name.
    pub name: String,
    /// Sandbox-relative file path.
    pub rel_path: String,
    /// Storage format.
    pub kind: NoteKind,
}

/// A document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLeaf {
    /// Document identifier.
    pub id: Uuid,
    /// Original filename.
    pub name: String,
    /// Pipeline status.
    pub status: DocumentStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentItem> for DocumentLeaf {
    fn from(item: &DocumentItem) -> Self {
        Self {
            id: item.id,
            name: item.original_file_name.clone(),
            status: item.status,
            created_at: item.created_at,
        }
    }
}

/// The merged hierarchy of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTree {
    /// Customer identifier.
    pub customer_id: i32,
    /// Customer display name.
    pub customer_name: String,
    /// Top-level nodes under the customer root.
    pub nodes: Vec<TreeNode>,
}

impl CustomerTree {
    /// Tree without any nodes.
    pub fn empty(customer_id: i32, customer_name: impl Into<String>) -> Self {
        Self {
            customer_id,
            customer_name: customer_name.into(),
            nodes: Vec::new(),
        }
    }

    /// Find a folder node by path.
    pub fn find_folder(&self, path: &FolderPath) -> Option<&FolderNode> {
        find_in(&self.nodes, path)
    }

    /// Total number of document leaves.
    pub fn document_count(&self) -> usize {
        count_documents(&self.nodes)
    }
}

fn find_in<'a>(nodes: &'a [TreeNode], path: &FolderPath) -> Option<&'a FolderNode> {
    nodes.iter().find_map(|node| match node {
        TreeNode::Folder(folder) if &folder.path == path => Some(folder),
        TreeNode::Folder(folder) if path.is_within(&folder.path) => {
            find_in(&folder.children, path)
        }
        _ => None,
    })
}

fn count_documents(nodes: &[TreeNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            TreeNode::Folder(folder) => count_documents(&folder.children),
            TreeNode::Document(_) => 1,
            TreeNode::Note(_) => 0,
        })
        .sum()
}
