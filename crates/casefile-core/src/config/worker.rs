//! Document pipeline worker configuration.

use serde::{Deserialize, Serialize};

/// Background pipeline worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Re-enqueue pending documents when the server starts.
    #[serde(default = "default_true")]
    pub recovery_on_startup: bool,
    /// Interval in seconds between recovery sweeps. `0` disables periodic sweeps.
    #[serde(default)]
    pub recovery_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recovery_on_startup: true,
            recovery_interval_seconds: 0,
        }
    }
}

fn default_true() -> bool {
    true
}
