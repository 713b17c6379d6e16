use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sorted-set backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Connection URL (redis backend).
    #[serde(default = "default_url")]
    pub url: String,

    /// Seed node URLs (redis-cluster backend). Falls back to `url` when empty.
    #[serde(default)]
    pub cluster_urls: Vec<String>,

    /// Prefix prepended to the cluster name to form the key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Per-command timeout in milliseconds.
    pub command_timeout_ms: Option<u64>,
}

impl StoreConfig {
    /// Per-command timeout, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    /// Seed nodes for a Redis Cluster connection.
    pub fn cluster_nodes(&self) -> Vec<String> {
        if self.cluster_urls.is_empty() {
            vec![self.url.clone()]
        } else {
            self.cluster_urls.clone()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_url(),
            cluster_urls: Vec::new(),
            key_prefix: default_key_prefix(),
            command_timeout_ms: None,
        }
    }
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "distributed-cron:".to_string()
}

/// Sorted-set backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// Redis sorted sets on a single node.
    #[default]
    Redis,

    /// Redis sorted sets on a Redis Cluster.
    RedisCluster,

    /// In-process store; only useful within a single process.
    Memory,
}
