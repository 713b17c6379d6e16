use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{DcronError, Result};

/// Name of a group of cooperating scheduler nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterName(String);

impl ClusterName {
    /// Validate and wrap a cluster name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DcronError::Config("cluster name must not be empty".into()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(DcronError::Config(format!(
                "cluster name must not contain whitespace: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClusterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one driver instance within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh identity scoped to `cluster`.
    pub fn generate(cluster: &ClusterName) -> Self {
        Self(format!("{}:{}", cluster, Uuid::new_v4()))
    }

    /// Wrap an identity read back from the store.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member of the shared registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberEntry {
    /// Node identity.
    pub node_id: NodeId,
    /// Time of the last successful registration or renewal.
    pub last_renewal: DateTime<Utc>,
}

impl MemberEntry {
    /// Build an entry from a sorted-set member and its score.
    pub fn from_scored(member: String, score: f64) -> Self {
        Self {
            node_id: NodeId::from_string(member),
            last_renewal: score_to_time(score),
        }
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_renewal
    }
}

/// Encode a timestamp as a sorted-set score (epoch milliseconds).
pub fn time_to_score(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

/// Decode a sorted-set score back into a timestamp.
pub fn score_to_time(score: f64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(score as i64)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
