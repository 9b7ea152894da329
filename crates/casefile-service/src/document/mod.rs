//! Document lifecycle.

pub mod service;

pub use service::{DocumentService, OpenedDocument, UploadResult};
