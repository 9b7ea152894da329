//! Folder management.

pub mod service;

pub use service::{FolderDeletion, FolderRename, FolderService};
