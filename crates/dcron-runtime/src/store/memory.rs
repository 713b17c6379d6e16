use std::collections::HashMap;
use std::sync::Arc;

use dcron_core::store::{ScoredMember, SortedSetStore};
use dcron_core::Result;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

/// In-process sorted-set store.
///
/// Clones share the same keyspace, so several drivers built from clones of one
/// `MemoryStore` see each other exactly as they would through a shared Redis.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sets: Arc<RwLock<HashMap<String, HashMap<String, f64>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members in a cluster's set.
    pub async fn len(&self, cluster: &str) -> usize {
        self.sets
            .read()
            .await
            .get(cluster)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Score of a single member.
    pub async fn score(&self, cluster: &str, member: &str) -> Option<f64> {
        self.sets
            .read()
            .await
            .get(cluster)
            .and_then(|set| set.get(member).copied())
    }
}

impl SortedSetStore for MemoryStore {
    fn upsert<'a>(
        &'a self,
        cluster: &'a str,
        member: &'a str,
        score: f64,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.sets
                .write()
                .await
                .entry(cluster.to_string())
                .or_default()
                .insert(member.to_string(), score);
            Ok(())
        })
    }

    fn range_by_score<'a>(
        &'a self,
        cluster: &'a str,
        min: f64,
        max: f64,
    ) -> BoxFuture<'a, Result<Vec<ScoredMember>>> {
        Box::pin(async move {
            let sets = self.sets.read().await;
            let mut members: Vec<ScoredMember> = sets
                .get(cluster)
                .map(|set| {
                    set.iter()
                        .filter(|(_, score)| **score >= min && **score <= max)
                        .map(|(member, score)| (member.clone(), *score))
                        .collect()
                })
                .unwrap_or_default();

            // Sorted sets order ties lexicographically by member.
            members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            Ok(members)
        })
    }

    fn remove_older_than<'a>(
        &'a self,
        cluster: &'a str,
        cutoff: f64,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            let mut sets = self.sets.write().await;
            let Some(set) = sets.get_mut(cluster) else {
                return Ok(0);
            };

            let before = set.len();
            set.retain(|_, score| *score >= cutoff);
            let removed = (before - set.len()) as u64;

            if set.is_empty() {
                sets.remove(cluster);
            }
            Ok(removed)
        })
    }

    fn remove<'a>(&'a self, cluster: &'a str, member: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let mut sets = self.sets.write().await;
            let Some(set) = sets.get_mut(cluster) else {
                return Ok(false);
            };

            let removed = set.remove(member).is_some();
            if set.is_empty() {
                sets.remove(cluster);
            }
            Ok(removed)
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
