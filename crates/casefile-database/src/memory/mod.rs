//! In-memory record stores backed by `DashMap`.
//!
//! Used by tests and by single-process tooling that runs without a
//! database. Contents live for the lifetime of the store.

pub mod customer;
pub mod document;

pub use customer::MemoryCustomerStore;
pub use document::MemoryDocumentStore;
