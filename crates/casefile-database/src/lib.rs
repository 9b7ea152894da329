//! # casefile-database
//!
//! PostgreSQL connection management, the record-store traits the rest of
//! Casefile depends on, and their PostgreSQL and in-memory implementations.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{CustomerStore, DocumentRecordStore};
