use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use dcron_core::cluster::{time_to_score, ClusterName, MemberEntry, NodeId};
use dcron_core::store::SortedSetStore;

/// Membership registry on top of a sorted-set store.
///
/// Every read and every registration first purges members whose last renewal
/// is older than the lease, so callers always see a lease-consistent snapshot
/// without a dedicated reaper.
pub struct MembershipRegistry {
    store: Arc<dyn SortedSetStore>,
    lease: Duration,
    cleanup_on_renew: bool,
}

impl MembershipRegistry {
    /// Create a new membership registry.
    pub fn new(store: Arc<dyn SortedSetStore>, lease: Duration) -> Self {
        Self {
            store,
            lease,
            cleanup_on_renew: true,
        }
    }

    /// Whether renewals also purge expired members.
    pub fn with_cleanup_on_renew(mut self, enabled: bool) -> Self {
        self.cleanup_on_renew = enabled;
        self
    }

    /// Get the lease duration.
    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Get the backing store.
    pub fn store(&self) -> &Arc<dyn SortedSetStore> {
        &self.store
    }

    /// Score below which an entry is expired at `now`.
    fn cutoff(&self, now: DateTime<Utc>) -> f64 {
        time_to_score(now) - self.lease.as_millis() as f64
    }

    /// Register a node, purging expired peers first.
    pub async fn register(
        &self,
        cluster: &ClusterName,
        node: &NodeId,
        now: DateTime<Utc>,
    ) -> dcron_core::Result<()> {
        self.purge_expired(cluster, now).await?;
        self.store
            .upsert(cluster.as_str(), node.as_str(), time_to_score(now))
            .await?;

        tracing::debug!(cluster = %cluster, node_id = %node, "Registered member");
        Ok(())
    }

    /// Refresh a node's renewal timestamp.
    pub async fn renew(
        &self,
        cluster: &ClusterName,
        node: &NodeId,
        now: DateTime<Utc>,
    ) -> dcron_core::Result<()> {
        if self.cleanup_on_renew {
            self.purge_expired(cluster, now).await?;
        }
        self.store
            .upsert(cluster.as_str(), node.as_str(), time_to_score(now))
            .await
    }

    /// Identities of every live member.
    pub async fn list(
        &self,
        cluster: &ClusterName,
        now: DateTime<Utc>,
    ) -> dcron_core::Result<Vec<NodeId>> {
        let entries = self.list_entries(cluster, now).await?;
        Ok(entries.into_iter().map(|e| e.node_id).collect())
    }

    /// Every live member with its last renewal time.
    pub async fn list_entries(
        &self,
        cluster: &ClusterName,
        now: DateTime<Utc>,
    ) -> dcron_core::Result<Vec<MemberEntry>> {
        self.purge_expired(cluster, now).await?;

        let members = self
            .store
            .range_by_score(cluster.as_str(), f64::NEG_INFINITY, f64::INFINITY)
            .await?;

        Ok(members
            .into_iter()
            .map(|(member, score)| MemberEntry::from_scored(member, score))
            .collect())
    }

    /// Remove a node. Returns false if a peer already purged it.
    pub async fn deregister(
        &self,
        cluster: &ClusterName,
        node: &NodeId,
    ) -> dcron_core::Result<bool> {
        let removed = self.store.remove(cluster.as_str(), node.as_str()).await?;

        if removed {
            tracing::debug!(cluster = %cluster, node_id = %node, "Deregistered member");
        } else {
            tracing::debug!(cluster = %cluster, node_id = %node, "Member already gone");
        }
        Ok(removed)
    }

    /// Remove members whose lease expired before `now`.
    pub async fn purge_expired(
        &self,
        cluster: &ClusterName,
        now: DateTime<Utc>,
    ) -> dcron_core::Result<u64> {
        let count = self
            .store
            .remove_older_than(cluster.as_str(), self.cutoff(now))
            .await?;

        if count > 0 {
            tracing::info!(cluster = %cluster, count, "Purged expired members");
        }
        Ok(count)
    }
}
