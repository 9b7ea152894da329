//! Document domain entities.

pub mod model;
pub mod status;

pub use model::{
    DocumentItem, MAX_ERROR_MESSAGE_LEN, MAX_ORIGINAL_FILE_NAME_LEN, MAX_STORED_PATH_LEN,
};
pub use status::DocumentStatus;
