use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::{timeout, DriverOption};

/// Cluster membership configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name shared by cooperating nodes.
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// Lease duration in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Purge expired members on every renewal.
    #[serde(default = "default_true")]
    pub cleanup_on_renew: bool,
}

impl ClusterConfig {
    /// Lease duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Driver options derived from this section.
    pub fn driver_options(&self) -> Vec<DriverOption> {
        vec![timeout(self.timeout())]
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            timeout_ms: default_timeout_ms(),
            cleanup_on_renew: true,
        }
    }
}

fn default_cluster_name() -> String {
    "default".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}
