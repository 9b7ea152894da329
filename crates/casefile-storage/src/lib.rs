//! # casefile-storage
//!
//! Filesystem side of Casefile: the project directory layout, the
//! per-customer path sandbox, collision-free naming, the customer
//! directory registry and document byte storage.

pub mod documents;
pub mod naming;
pub mod paths;
pub mod registry;
pub mod sandbox;
pub mod upload;

pub use documents::DocumentStorage;
pub use paths::AppPaths;
pub use registry::{CustomerDirectory, CustomerDirectoryRegistry, DirectoryOutcome};
pub use sandbox::PathSandbox;
pub use upload::{BytesUpload, UploadSource};
