use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dcron_core::cluster::{ClusterName, DriverState, MemberEntry, NodeId};
use dcron_core::driver::{Driver, DriverOption, DriverOptions};
use dcron_core::store::SortedSetStore;
use dcron_core::{Context, DcronError, Result};
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use super::heartbeat::{HeartbeatConfig, HeartbeatHandle, HeartbeatLoop};
use super::registry::MembershipRegistry;
use crate::store::RedisStore;

/// Membership driver over a sorted-set store.
///
/// Each live node owns one member of the cluster's sorted set, scored by its
/// last renewal time. `start` writes the member synchronously, a heartbeat task
/// rewrites it every half lease, and every read purges members older than the
/// lease before listing.
pub struct ZSetDriver {
    store: Arc<dyn SortedSetStore>,
    cleanup_on_renew: bool,
    setup: OnceLock<DriverSetup>,
    lifecycle: Mutex<Lifecycle>,
}

/// Fixed at `init`.
struct DriverSetup {
    cluster: ClusterName,
    node_id: NodeId,
    options: DriverOptions,
    registry: Arc<MembershipRegistry>,
}

#[derive(Default)]
struct Lifecycle {
    state: DriverState,
    // None while running only after a stop that failed to deregister.
    heartbeat: Option<HeartbeatHandle>,
}

impl ZSetDriver {
    /// Create a driver over `store`.
    pub fn new(store: impl SortedSetStore) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Create a driver over a shared store.
    pub fn from_arc(store: Arc<dyn SortedSetStore>) -> Self {
        Self {
            store,
            cleanup_on_renew: true,
            setup: OnceLock::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Connect to Redis and create a driver over it.
    pub async fn redis(redis_url: &str) -> Result<Self> {
        Ok(Self::new(RedisStore::connect(redis_url).await?))
    }

    /// Whether renewals also purge expired peers. Must be set before `init`.
    pub fn with_cleanup_on_renew(mut self, enabled: bool) -> Self {
        self.cleanup_on_renew = enabled;
        self
    }

    fn setup(&self, operation: &'static str) -> Result<&DriverSetup> {
        self.setup
            .get()
            .ok_or(DcronError::NotInitialized(operation))
    }

    /// Get the cluster name.
    pub fn cluster_name(&self) -> Result<&ClusterName> {
        Ok(&self.setup("cluster_name")?.cluster)
    }

    /// Get the lease duration.
    pub fn lease(&self) -> Result<Duration> {
        Ok(self.setup("lease")?.options.timeout)
    }

    /// Get the backing store.
    pub fn store(&self) -> &Arc<dyn SortedSetStore> {
        &self.store
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> DriverState {
        self.lifecycle.lock().await.state
    }

    /// Every live member with its last renewal time.
    pub async fn members(&self, ctx: &Context) -> Result<Vec<MemberEntry>> {
        let setup = self.setup("members")?;
        ctx.run(
            setup
                .registry
                .list_entries(&setup.cluster, setup.options.clock.now()),
        )
        .await
    }

    fn init_inner(&self, cluster_name: &str, options: Vec<DriverOption>) -> Result<()> {
        if self.setup.get().is_some() {
            return Err(DcronError::Config("driver already initialized".into()));
        }

        let cluster = ClusterName::new(cluster_name)?;
        let options = DriverOptions::resolve(options)?;
        let node_id = NodeId::generate(&cluster);
        let registry = Arc::new(
            MembershipRegistry::new(self.store.clone(), options.timeout)
                .with_cleanup_on_renew(self.cleanup_on_renew),
        );

        let setup = DriverSetup {
            cluster,
            node_id,
            options,
            registry,
        };
        self.setup
            .set(setup)
            .map_err(|_| DcronError::Config("driver already initialized".into()))?;

        let setup = self.setup("init")?;
        let timeout = format!("{:?}", setup.options.timeout);
        setup.options.logger.info(
            "Driver initialized",
            &[
                ("cluster", &setup.cluster),
                ("node_id", &setup.node_id),
                ("timeout", &timeout),
                ("backend", &self.store.backend_name()),
            ],
        );
        Ok(())
    }

    async fn start_inner(&self, ctx: &Context) -> Result<()> {
        let setup = self.setup("start")?;
        let logger = &setup.options.logger;
        let mut lifecycle = ctx.run(async { Ok(self.lifecycle.lock().await) }).await?;

        if lifecycle.state.is_running() && lifecycle.heartbeat.is_some() {
            logger.debug("Driver already running", &[("node_id", &setup.node_id)]);
            return Ok(());
        }

        // Peers must see this node once start returns. On failure nothing changed.
        ctx.run(
            setup
                .registry
                .register(&setup.cluster, &setup.node_id, setup.options.clock.now()),
        )
        .await?;

        let heartbeat = HeartbeatLoop::new(
            setup.registry.clone(),
            setup.cluster.clone(),
            setup.node_id.clone(),
            HeartbeatConfig::from_lease(setup.options.timeout),
            setup.options.logger.clone(),
            setup.options.clock.clone(),
        );
        lifecycle.heartbeat = Some(heartbeat.spawn());
        lifecycle.state = DriverState::Running;

        logger.info(
            "Driver started",
            &[("cluster", &setup.cluster), ("node_id", &setup.node_id)],
        );
        Ok(())
    }

    async fn stop_inner(&self, ctx: &Context) -> Result<()> {
        let setup = self.setup("stop")?;
        let logger = &setup.options.logger;
        let mut lifecycle = ctx.run(async { Ok(self.lifecycle.lock().await) }).await?;

        if !lifecycle.state.is_running() {
            return Ok(());
        }

        // Not bounded by ctx. No renewal may land after the removal below.
        if let Some(heartbeat) = lifecycle.heartbeat.take() {
            heartbeat.shutdown().await;
        }

        match ctx
            .run(setup.registry.deregister(&setup.cluster, &setup.node_id))
            .await
        {
            Ok(_) => {
                lifecycle.state = DriverState::Stopped;
                logger.info(
                    "Driver stopped",
                    &[("cluster", &setup.cluster), ("node_id", &setup.node_id)],
                );
                Ok(())
            }
            Err(e) => {
                logger.warn(
                    "Deregister failed, entry will expire after the lease",
                    &[("node_id", &setup.node_id), ("error", &e)],
                );
                Err(e)
            }
        }
    }

    async fn list_nodes(&self, ctx: &Context) -> Result<Vec<String>> {
        let setup = self.setup("get_nodes")?;
        let nodes = ctx
            .run(
                setup
                    .registry
                    .list(&setup.cluster, setup.options.clock.now()),
            )
            .await?;
        Ok(nodes.into_iter().map(NodeId::into_string).collect())
    }
}

impl Driver for ZSetDriver {
    fn init(&self, cluster_name: &str, options: Vec<DriverOption>) -> Result<()> {
        self.init_inner(cluster_name, options)
    }

    fn node_id(&self) -> Result<NodeId> {
        Ok(self.setup("node_id")?.node_id.clone())
    }

    fn start<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.start_inner(ctx))
    }

    fn stop<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.stop_inner(ctx))
    }

    fn get_nodes<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(self.list_nodes(ctx))
    }
}

impl Drop for ZSetDriver {
    fn drop(&mut self) {
        let running = self.lifecycle.get_mut().state.is_running();
        if let (true, Some(setup)) = (running, self.setup.get()) {
            // The heartbeat handle cancels its task when dropped.
            tracing::debug!(
                node_id = %setup.node_id,
                "Driver dropped while running (stop should be called explicitly)"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{CaptureLogger, FlakyStore, TokioClock};
    use dcron_core::driver::{self as opts, LogLevel};
    use std::collections::HashSet;

    const LEASE: Duration = Duration::from_secs(5);

    fn new_driver(store: impl SortedSetStore, clock: &TokioClock) -> ZSetDriver {
        let drv = ZSetDriver::new(store);
        drv.init(
            "jobs",
            vec![opts::timeout(LEASE), opts::clock(clock.clone())],
        )
        .unwrap();
        drv
    }

    async fn nodes(drv: &ZSetDriver) -> Vec<String> {
        drv.get_nodes(&Context::background()).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_instance_sees_all_started_peers() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();

        let mut drivers = Vec::new();
        for _ in 0..10 {
            let drv = new_driver(store.clone(), &clock);
            drv.start(&ctx).await.unwrap();
            drivers.push(drv);
        }

        let expected: HashSet<String> = drivers
            .iter()
            .map(|d| d.node_id().unwrap().into_string())
            .collect();
        assert_eq!(expected.len(), 10);

        for drv in &drivers {
            let seen: HashSet<String> = nodes(drv).await.into_iter().collect();
            assert_eq!(seen, expected);
        }

        for drv in &drivers {
            drv.stop(&ctx).await.unwrap();
        }
        assert_eq!(store.len("jobs").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_convergence() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv1 = new_driver(store.clone(), &clock);
        let drv2 = new_driver(store.clone(), &clock);

        drv2.start(&ctx).await.unwrap();
        drv1.start(&ctx).await.unwrap();
        assert_eq!(nodes(&drv1).await.len(), 2);
        assert_eq!(nodes(&drv2).await.len(), 2);

        drv1.stop(&ctx).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(
            nodes(&drv2).await,
            vec![drv2.node_id().unwrap().into_string()]
        );

        drv1.start(&ctx).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(nodes(&drv2).await.len(), 2);
        assert!(nodes(&drv2)
            .await
            .contains(&drv1.node_id().unwrap().into_string()));

        drv1.stop(&ctx).await.unwrap();
        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_node_stays_visible_across_many_leases() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv1 = new_driver(store.clone(), &clock);
        let drv2 = new_driver(store.clone(), &clock);
        drv1.start(&ctx).await.unwrap();
        drv2.start(&ctx).await.unwrap();

        for _ in 0..12 {
            tokio::time::sleep(Duration::from_millis(1700)).await;
            assert_eq!(nodes(&drv1).await.len(), 2);
        }

        drv1.stop(&ctx).await.unwrap();
        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv1 = new_driver(store.clone(), &clock);
        let drv2 = new_driver(store.clone(), &clock);
        drv1.start(&ctx).await.unwrap();
        drv2.start(&ctx).await.unwrap();

        drv1.stop(&ctx).await.unwrap();
        let after_first = nodes(&drv2).await;
        drv1.stop(&ctx).await.unwrap();

        assert_eq!(nodes(&drv2).await, after_first);
        assert_eq!(drv1.state().await, DriverState::Stopped);

        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let drv = new_driver(MemoryStore::new(), &TokioClock::new());
        drv.stop(&Context::background()).await.unwrap();
        assert_eq!(drv.state().await, DriverState::Created);
    }

    #[tokio::test]
    async fn test_operations_before_init_fail() {
        let drv = ZSetDriver::new(MemoryStore::new());
        let ctx = Context::background();

        assert!(matches!(
            drv.start(&ctx).await,
            Err(DcronError::NotInitialized("start"))
        ));
        assert!(matches!(
            drv.stop(&ctx).await,
            Err(DcronError::NotInitialized("stop"))
        ));
        assert!(matches!(
            drv.get_nodes(&ctx).await,
            Err(DcronError::NotInitialized("get_nodes"))
        ));
        assert!(drv.node_id().is_err());
        assert!(drv.lease().is_err());
    }

    #[tokio::test]
    async fn test_init_validation() {
        let drv = ZSetDriver::new(MemoryStore::new());

        let err = drv
            .init("jobs", vec![opts::timeout(Duration::ZERO)])
            .unwrap_err();
        assert!(matches!(err, DcronError::Config(_)));
        assert!(matches!(drv.init("", vec![]), Err(DcronError::Config(_))));

        // A rejected init leaves the driver uninitialized.
        drv.init("jobs", vec![opts::timeout(Duration::from_secs(8))])
            .unwrap();
        assert_eq!(drv.lease().unwrap(), Duration::from_secs(8));
        assert_eq!(drv.cluster_name().unwrap().as_str(), "jobs");
        assert!(drv.node_id().unwrap().as_str().starts_with("jobs:"));

        let err = drv.init("jobs", vec![]).unwrap_err();
        assert!(err.to_string().contains("already initialized"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop() {
        let store = MemoryStore::new();
        let flaky = FlakyStore::new(store.clone());
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv = new_driver(flaky.clone(), &clock);

        drv.start(&ctx).await.unwrap();
        drv.start(&ctx).await.unwrap();
        assert_eq!(flaky.upserts(), 1);
        assert_eq!(store.len("jobs").await, 1);
        assert_eq!(drv.state().await, DriverState::Running);

        drv.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_register_aborts_start() {
        let store = MemoryStore::new();
        let flaky = FlakyStore::new(store.clone());
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv = new_driver(flaky.clone(), &clock);

        flaky.fail_writes(true);
        let err = drv.start(&ctx).await.unwrap_err();
        assert!(matches!(err, DcronError::Store(_)));
        assert_eq!(drv.state().await, DriverState::Created);

        // No heartbeat was launched.
        flaky.fail_writes(false);
        tokio::time::sleep(LEASE * 2).await;
        assert_eq!(store.len("jobs").await, 0);

        drv.start(&ctx).await.unwrap();
        assert_eq!(drv.state().await, DriverState::Running);
        drv.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_start_leaves_state_unchanged() {
        let store = MemoryStore::new();
        let drv = new_driver(store.clone(), &TokioClock::new());

        let ctx = Context::background();
        ctx.cancel();
        assert!(matches!(
            drv.start(&ctx).await,
            Err(DcronError::Cancelled)
        ));
        assert_eq!(drv.state().await, DriverState::Created);
        assert_eq!(store.len("jobs").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_deadline_against_hung_store() {
        let flaky = FlakyStore::new(MemoryStore::new());
        let drv = new_driver(flaky.clone(), &TokioClock::new());

        flaky.hang(true);
        let ctx = Context::with_timeout(Duration::from_millis(300));
        assert!(matches!(
            drv.start(&ctx).await,
            Err(DcronError::DeadlineExceeded(_))
        ));
        assert_eq!(drv.state().await, DriverState::Created);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_applies_while_lifecycle_is_busy() {
        let flaky = FlakyStore::new(MemoryStore::new());
        let drv = Arc::new(new_driver(flaky.clone(), &TokioClock::new()));
        drv.start(&Context::background()).await.unwrap();

        // A stop stuck in the store keeps the lifecycle locked.
        flaky.hang(true);
        let stuck = {
            let drv = drv.clone();
            tokio::spawn(async move { drv.stop(&Context::background()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let waited_from = tokio::time::Instant::now();
        let ctx = Context::with_timeout(Duration::from_millis(300));
        assert!(matches!(
            drv.start(&ctx).await,
            Err(DcronError::DeadlineExceeded(_))
        ));
        let ctx = Context::with_timeout(Duration::from_millis(300));
        assert!(matches!(
            drv.stop(&ctx).await,
            Err(DcronError::DeadlineExceeded(_))
        ));
        assert!(waited_from.elapsed() < Duration::from_secs(1));

        let cancelled = Context::background();
        cancelled.cancel();
        assert!(matches!(
            drv.start(&cancelled).await,
            Err(DcronError::Cancelled)
        ));

        stuck.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restart_stays_stopped() {
        let store = MemoryStore::new();
        let flaky = FlakyStore::new(store.clone());
        let ctx = Context::background();
        let drv = new_driver(flaky.clone(), &TokioClock::new());
        drv.start(&ctx).await.unwrap();
        drv.stop(&ctx).await.unwrap();

        flaky.fail_writes(true);
        assert!(matches!(drv.start(&ctx).await, Err(DcronError::Store(_))));
        assert_eq!(drv.state().await, DriverState::Stopped);

        // No heartbeat was launched by the failed restart.
        flaky.fail_writes(false);
        tokio::time::sleep(LEASE * 2).await;
        assert_eq!(store.len("jobs").await, 0);
        drv.stop(&ctx).await.unwrap();
        assert_eq!(drv.state().await, DriverState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_stop_still_halts_heartbeat() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv1 = new_driver(store.clone(), &clock);
        let drv2 = new_driver(store.clone(), &clock);
        drv1.start(&ctx).await.unwrap();
        drv2.start(&ctx).await.unwrap();

        let cancelled = Context::background();
        cancelled.cancel();
        assert!(matches!(
            drv1.stop(&cancelled).await,
            Err(DcronError::Cancelled)
        ));
        assert_eq!(drv1.state().await, DriverState::Running);

        // No renewals any more, so the leftover entry expires.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(nodes(&drv2).await.len(), 1);

        // Retrying completes the stop even though the entry is gone.
        drv1.stop(&ctx).await.unwrap();
        assert_eq!(drv1.state().await, DriverState::Stopped);
        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_peer_expires() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv1 = new_driver(store.clone(), &clock);
        let drv2 = new_driver(store.clone(), &clock);
        let crashed = new_driver(store.clone(), &clock);
        drv1.start(&ctx).await.unwrap();
        drv2.start(&ctx).await.unwrap();
        crashed.start(&ctx).await.unwrap();
        assert_eq!(nodes(&drv1).await.len(), 3);

        drop(crashed);
        tokio::time::sleep(Duration::from_secs(6)).await;

        // Never more identities than running instances.
        assert_eq!(nodes(&drv1).await.len(), 2);
        assert_eq!(nodes(&drv2).await.len(), 2);

        drv1.stop(&ctx).await.unwrap();
        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_renewal_failure_does_not_evict() {
        let store = MemoryStore::new();
        let flaky = FlakyStore::new(store.clone());
        let clock = TokioClock::new();
        let logger = CaptureLogger::new();
        let ctx = Context::background();

        let drv1 = ZSetDriver::new(flaky.clone());
        drv1.init(
            "jobs",
            vec![
                opts::timeout(LEASE),
                opts::clock(clock.clone()),
                opts::logger(logger.clone()),
            ],
        )
        .unwrap();
        let drv2 = new_driver(store.clone(), &clock);
        drv1.start(&ctx).await.unwrap();
        drv2.start(&ctx).await.unwrap();

        // The renewal at 2.5s fails.
        flaky.fail_writes(true);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(nodes(&drv2).await.len(), 2);
        assert_eq!(drv1.state().await, DriverState::Running);
        assert_eq!(logger.records_at(LogLevel::Warn).len(), 1);

        // The renewal at 5s succeeds.
        flaky.fail_writes(false);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(nodes(&drv2).await.len(), 2);
        assert!(logger.contains(LogLevel::Info, "recovered"));

        drv1.stop(&ctx).await.unwrap();
        drv2.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_writes_fresh_registration() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let drv = new_driver(store.clone(), &clock);
        let id = drv.node_id().unwrap();

        drv.start(&ctx).await.unwrap();
        let first = store.score("jobs", id.as_str()).await.unwrap();
        drv.stop(&ctx).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        drv.start(&ctx).await.unwrap();
        let second = store.score("jobs", id.as_str()).await.unwrap();
        assert!(second > first);
        assert_eq!(drv.node_id().unwrap(), id);

        drv.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_nodes_without_joining() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let ctx = Context::background();
        let member = new_driver(store.clone(), &clock);
        let observer = new_driver(store.clone(), &clock);
        member.start(&ctx).await.unwrap();

        assert_eq!(
            nodes(&observer).await,
            vec![member.node_id().unwrap().into_string()]
        );
        assert_eq!(observer.state().await, DriverState::Created);

        let entries = observer.members(&ctx).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].node_id, member.node_id().unwrap());

        member.stop(&ctx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_nodes_propagates_store_errors() {
        let flaky = FlakyStore::new(MemoryStore::new());
        let drv = new_driver(flaky.clone(), &TokioClock::new());

        flaky.fail_reads(true);
        let err = drv.get_nodes(&Context::background()).await.unwrap_err();
        assert!(matches!(err, DcronError::Store(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_usable_as_trait_object() {
        let store = MemoryStore::new();
        let clock = TokioClock::new();
        let drivers: Vec<Arc<dyn Driver>> = vec![
            Arc::new(new_driver(store.clone(), &clock)),
            Arc::new(new_driver(store.clone(), &clock)),
        ];
        let ctx = Context::background();

        let mut handles = Vec::new();
        for drv in &drivers {
            let drv = drv.clone();
            handles.push(tokio::spawn(async move {
                drv.start(&Context::background()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(drivers[0].get_nodes(&ctx).await.unwrap().len(), 2);
        for drv in &drivers {
            drv.stop(&ctx).await.unwrap();
        }
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into())
    }

    async fn redis_driver(cluster: &str) -> ZSetDriver {
        let drv = ZSetDriver::redis(&redis_url()).await.unwrap();
        drv.init(cluster, vec![opts::timeout(LEASE)]).unwrap();
        drv
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_redis_every_instance_sees_all_started_peers() {
        let cluster = format!("it-all-{}", std::process::id());
        let ctx = Context::background();

        let mut drivers = Vec::new();
        for _ in 0..10 {
            let drv = redis_driver(&cluster).await;
            drv.start(&ctx).await.unwrap();
            drivers.push(drv);
        }

        for drv in &drivers {
            assert_eq!(nodes(drv).await.len(), 10);
        }
        for drv in &drivers {
            drv.stop(&ctx).await.unwrap();
        }
        assert!(nodes(&drivers[0]).await.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_redis_restart_convergence() {
        let cluster = format!("it-restart-{}", std::process::id());
        let ctx = Context::background();
        let drv1 = redis_driver(&cluster).await;
        let drv2 = redis_driver(&cluster).await;

        drv2.start(&ctx).await.unwrap();
        drv1.start(&ctx).await.unwrap();
        assert_eq!(nodes(&drv1).await.len(), 2);
        assert_eq!(nodes(&drv2).await.len(), 2);

        drv1.stop(&ctx).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(nodes(&drv2).await.len(), 1);

        drv1.start(&ctx).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(nodes(&drv2).await.len(), 2);

        drv1.stop(&ctx).await.unwrap();
        drv2.stop(&ctx).await.unwrap();
    }
}
