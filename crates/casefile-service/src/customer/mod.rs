//! Customer management.

pub mod service;

pub use service::CustomerService;
