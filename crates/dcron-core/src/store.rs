use futures::future::BoxFuture;

use crate::error::Result;

/// A member of a sorted set together with its score.
pub type ScoredMember = (String, f64);

/// Networked sorted-set keyspace used as the membership medium.
///
/// Every call is scoped by cluster name and assumed atomic with respect to a
/// single backing store; callers add no locking of their own. Backend failures
/// come back as `DcronError::Store` with the backend error as the source.
pub trait SortedSetStore: Send + Sync + 'static {
    /// Set or update the score of `member`.
    fn upsert<'a>(
        &'a self,
        cluster: &'a str,
        member: &'a str,
        score: f64,
    ) -> BoxFuture<'a, Result<()>>;

    /// Members with `min <= score <= max`, ordered by ascending score.
    fn range_by_score<'a>(
        &'a self,
        cluster: &'a str,
        min: f64,
        max: f64,
    ) -> BoxFuture<'a, Result<Vec<ScoredMember>>>;

    /// Remove every member with score strictly below `cutoff`.
    fn remove_older_than<'a>(
        &'a self,
        cluster: &'a str,
        cutoff: f64,
    ) -> BoxFuture<'a, Result<u64>>;

    /// Remove `member`. Returns false if it was not present.
    fn remove<'a>(&'a self, cluster: &'a str, member: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
