//! # casefile-service
//!
//! Business operations of Casefile. Each service combines the record
//! stores from `casefile-database` with the filesystem side from
//! `casefile-storage` so that records and directories stay consistent.

pub mod customer;
pub mod document;
pub mod folder;
pub mod note;
pub mod tree;

pub use customer::CustomerService;
pub use document::{DocumentService, OpenedDocument, UploadResult};
pub use folder::{FolderDeletion, FolderRename, FolderService};
pub use note::NoteStore;
pub use tree::TreeBuilder;
