use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dcron_core::store::{ScoredMember, SortedSetStore};
use dcron_core::{DcronError, Result};
use futures::future::BoxFuture;

/// Store wrapper that injects backend failures on demand.
///
/// Clones share their switches, so a test can keep one clone and flip
/// failures while a driver owns another.
#[derive(Clone)]
pub struct FlakyStore {
    inner: Arc<dyn SortedSetStore>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    hang: Arc<AtomicBool>,
    upserts: Arc<AtomicU64>,
}

impl FlakyStore {
    /// Wrap a store; all switches start off.
    pub fn new(inner: impl SortedSetStore) -> Self {
        Self {
            inner: Arc::new(inner),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            hang: Arc::new(AtomicBool::new(false)),
            upserts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fail `upsert`, `remove_older_than` and `remove`.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Fail `range_by_score`.
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Never complete any call.
    pub fn hang(&self, enabled: bool) {
        self.hang.store(enabled, Ordering::SeqCst);
    }

    /// Number of successful upserts.
    pub fn upserts(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    async fn gate(&self, failing: &AtomicBool) -> Result<()> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if failing.load(Ordering::SeqCst) {
            return Err(DcronError::store(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "injected store failure",
            )));
        }
        Ok(())
    }
}

impl SortedSetStore for FlakyStore {
    fn upsert<'a>(
        &'a self,
        cluster: &'a str,
        member: &'a str,
        score: f64,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.gate(&self.fail_writes).await?;
            self.inner.upsert(cluster, member, score).await?;
            self.upserts.fetch_add(1, Ordering::SeqCst);
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
            self.gate(&self.fail_reads).await?;
            self.inner.range_by_score(cluster, min, max).await
        })
    }

    fn remove_older_than<'a>(
        &'a self,
        cluster: &'a str,
        cutoff: f64,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            self.gate(&self.fail_writes).await?;
            self.inner.remove_older_than(cluster, cutoff).await
        })
    }

    fn remove<'a>(&'a self, cluster: &'a str, member: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            self.gate(&self.fail_writes).await?;
            self.inner.remove(cluster, member).await
        })
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
