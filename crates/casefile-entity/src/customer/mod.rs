//! Customer domain entities.

pub mod model;

pub use model::{CreateCustomer, Customer, MAX_CUSTOMER_NAME_LEN};
