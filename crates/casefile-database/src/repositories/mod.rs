//! PostgreSQL implementations of the record stores.

pub mod customer;
pub mod document;

pub use customer::CustomerRepository;
pub use document::DocumentRepository;
