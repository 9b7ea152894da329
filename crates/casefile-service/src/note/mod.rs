//! Notes and folders on disk.

pub mod delta;
pub mod store;

pub use delta::{clean_delta, clean_delta_json, clean_delta_value};
pub use store::NoteStore;
