//! Folder domain values.

pub mod path;

pub use path::{FolderPath, ROOT_SENTINEL, is_root_sentinel, normalize_rel_path};
