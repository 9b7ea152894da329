//! Document upload configuration.

use serde::{Deserialize, Serialize};

/// Where uploaded bytes are placed inside the target folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadLayout {
    /// `<folder>/<filename>` with collision suffixing.
    #[default]
    Named,
    /// `<folder>/Documents/<date>/<id>/original<ext>`.
    Dated,
}

/// Upload validation and placement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum upload size in bytes (default 30 MiB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Allowed file extensions, lowercase with leading dot.
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Allowed declared content types, lowercase.
    #[serde(default = "default_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Accept `application/octet-stream` for `.pdf` files.
    #[serde(default = "default_true")]
    pub allow_octet_stream_pdf: bool,
    /// Placement of stored bytes.
    #[serde(default)]
    pub layout: UploadLayout,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: default_max_upload(),
            allowed_extensions: default_extensions(),
            allowed_content_types: default_content_types(),
            allow_octet_stream_pdf: true,
            layout: UploadLayout::default(),
        }
    }
}

fn default_max_upload() -> u64 {
    30 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "application/pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}
