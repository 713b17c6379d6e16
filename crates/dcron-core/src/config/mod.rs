mod cluster;
mod observability;
mod store;

pub use cluster::ClusterConfig;
pub use observability::ObservabilityConfig;
pub use store::{StoreBackend, StoreConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DcronError, Result};

/// Root configuration for a dcron node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcronConfig {
    /// Cluster membership configuration.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Sorted-set backend configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl DcronConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DcronError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| DcronError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static pattern");

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
