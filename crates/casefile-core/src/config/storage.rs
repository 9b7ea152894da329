//! Filesystem layout configuration.

use serde::{Deserialize, Serialize};

/// Where customer data lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Project root. All stored relative paths are relative to this directory.
    #[serde(default = "default_project_root")]
    pub project_root: String,
    /// Data directory name under the project root.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Clients directory name under the data directory.
    #[serde(default = "default_clients_dir")]
    pub clients_dir: String,
    /// Name of the reserved default folder inside every customer directory.
    #[serde(default = "default_folder")]
    pub default_folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            data_dir: default_data_dir(),
            clients_dir: default_clients_dir(),
            default_folder: default_folder(),
        }
    }
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_data_dir() -> String {
    "Data".to_string()
}

fn default_clients_dir() -> String {
    "Clients".to_string()
}

fn default_folder() -> String {
    "Dokumente".to_string()
}
