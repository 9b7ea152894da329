//! Merged folder/note/document tree.
//!
//! Folders and notes come from a walk of the customer directory; documents
//! come from the record store and are placed by their folder identifier.
//! The tree is rebuilt on every call.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::fs;
use tracing::{debug, warn};

use casefile_core::AppResult;
use casefile_database::{CustomerStore, DocumentRecordStore};
use casefile_entity::customer::Customer;
use casefile_entity::folder::FolderPath;
use casefile_entity::note::{NoteKind, display_name};
use casefile_entity::tree::{CustomerTree, DocumentLeaf, FolderNode, NoteLeaf, TreeNode};
use casefile_storage::documents::DATED_LAYOUT_DIR;
use casefile_storage::CustomerDirectoryRegistry;

/// Builds per-customer trees.
#[derive(Clone)]
pub struct TreeBuilder {
    registry: CustomerDirectoryRegistry,
    customers: Arc<dyn CustomerStore>,
    documents: Arc<dyn DocumentRecordStore>,
}

impl TreeBuilder {
    /// Creates a new tree builder.
    pub fn new(
        registry: CustomerDirectoryRegistry,
        customers: Arc<dyn CustomerStore>,
        documents: Arc<dyn DocumentRecordStore>,
    ) -> Self {
        Self {
            registry,
            customers,
            documents,
        }
    }

    /// Trees of all customers, ordered by customer name.
    pub async fn sidebar(&self) -> AppResult<Vec<CustomerTree>> {
        let mut trees = Vec::new();
        for customer in self.customers.list().await? {
            trees.push(self.build(&customer).await?);
        }
        Ok(trees)
    }

    /// Tree of one customer by identifier.
    pub async fn build_for(&self, customer_id: i32) -> AppResult<CustomerTree> {
        let customer = self.customers.get_by_id(customer_id).await?;
        self.build(&customer).await
    }

    /// Tree of one customer.
    ///
    /// Each level lists folders, then notes, then documents. Documents whose
    /// folder is missing on disk appear in the default folder.
    pub async fn build(&self, customer: &Customer) -> AppResult<CustomerTree> {
        let mut tree = CustomerTree::empty(customer.id, customer.name.clone());

        match self.registry.find_by_id(customer.id).await? {
            Some(dir) => tree.nodes = walk(dir, FolderPath::root()).await?,
            None => debug!(customer_id = customer.id, "No customer directory; tree has no folders"),
        }

        let documents = self.documents.list_by_customer(customer.id).await?;
        let leaves = documents
            .iter()
            .map(|doc| (doc.folder_id.as_str(), DocumentLeaf::from(doc)));
        self.splice_documents(&mut tree.nodes, leaves);
        Ok(tree)
    }

    fn splice_documents<'a>(
        &self,
        nodes: &mut Vec<TreeNode>,
        documents: impl Iterator<Item = (&'a str, DocumentLeaf)>,
    ) {
        let default_folder = FolderPath::from_folder_id(self.registry.paths().default_folder())
            .unwrap_or_default();

        let mut by_folder: BTreeMap<FolderPath, Vec<DocumentLeaf>> = BTreeMap::new();
        for (folder_id, leaf) in documents {
            let folder = match FolderPath::from_folder_id(folder_id) {
                Ok(folder) if !folder.is_root() => folder,
                Ok(_) => default_folder.clone(),
                Err(_) => {
                    warn!(document_id = %leaf.id, folder_id, "Invalid folder identifier; showing in default folder");
                    default_folder.clone()
                }
            };
            by_folder.entry(folder).or_default().push(leaf);
        }

        let mut orphans = Vec::new();
        for (folder, mut leaves) in by_folder {
            leaves.sort_by(compare_documents);
            match find_folder_mut(nodes, &folder) {
                Some(node) => node.children.extend(leaves.into_iter().map(TreeNode::Document)),
                None => orphans.extend(leaves),
            }
        }
        if orphans.is_empty() {
            return;
        }

        orphans.sort_by(compare_documents);
        if find_folder_mut(nodes, &default_folder).is_none() {
            let name = default_folder.name().unwrap_or_default().to_string();
            insert_folder(nodes, FolderNode::new(name, default_folder.clone()));
        }
        if let Some(node) = find_folder_mut(nodes, &default_folder) {
            node.children.extend(orphans.into_iter().map(TreeNode::Document));
        }
    }
}

fn compare_documents(a: &DocumentLeaf, b: &DocumentLeaf) -> Ordering {
    compare_names(&a.name, &b.name).then(a.created_at.cmp(&b.created_at))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn find_folder_mut<'a>(nodes: &'a mut [TreeNode], path: &FolderPath) -> Option<&'a mut FolderNode> {
    for node in nodes.iter_mut() {
        let TreeNode::Folder(folder) = node else {
            continue;
        };
        if &folder.path == path {
            return Some(folder);
        }
        if path.is_within(&folder.path) {
            return find_folder_mut(&mut folder.children, path);
        }
    }
    None
}

/// Insert a top-level folder at its sorted position among the folders.
fn insert_folder(nodes: &mut Vec<TreeNode>, folder: FolderNode) {
    let index = nodes
        .iter()
        .position(|node| match node {
            TreeNode::Folder(existing) => compare_names(&existing.name, &folder.name) == Ordering::Greater,
            _ => true,
        })
        .unwrap_or(nodes.len());
    nodes.insert(index, TreeNode::Folder(folder));
}

/// Walk a directory into folder and note nodes. Symbolic links are skipped.
fn walk(dir: PathBuf, rel: FolderPath) -> BoxFuture<'static, AppResult<Vec<TreeNode>>> {
    Box::pin(async move {
        let mut folders = Vec::new();
        let mut notes = Vec::new();

        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            if file_type.is_dir() {
                if name == DATED_LAYOUT_DIR && is_dated_layout(&entry.path()).await {
                    continue;
                }
                folders.push((name, entry.path()));
            } else if file_type.is_file() {
                if let Some(kind) = NoteKind::from_file_name(&name) {
                    notes.push((name, kind));
                }
            }
        }

        folders.sort_by(|a, b| compare_names(&a.0, &b.0));
        notes.sort_by(|a, b| compare_names(&a.0, &b.0));

        let mut nodes = Vec::with_capacity(folders.len() + notes.len());
        for (name, path) in folders {
            let child_rel = rel.join(&name);
            let mut folder = FolderNode::new(name, child_rel.clone());
            folder.children = walk(path, child_rel).await?;
            nodes.push(TreeNode::Folder(folder));
        }
        for (name, kind) in notes {
            nodes.push(TreeNode::Note(NoteLeaf {
                name: display_name(&name),
                rel_path: rel.file(&name),
                kind,
            }));
        }
        Ok(nodes)
    })
}

/// Whether a `Documents` directory holds only `yyyy-MM-dd` subdirectories,
/// i.e. it belongs to the dated upload layout rather than the user.
async fn is_dated_layout(dir: &std::path::Path) -> bool {
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return false;
    };
    let mut any = false;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        let name = entry.file_name();
        if !is_dir || !name.to_str().is_some_and(is_date_name) {
            return false;
        }
        any = true;
    }
    any
}

fn is_date_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
