//! Merged folder/note/document hierarchy.

pub mod node;

pub use node::{CustomerTree, DocumentLeaf, FolderNode, NoteLeaf, TreeNode};
