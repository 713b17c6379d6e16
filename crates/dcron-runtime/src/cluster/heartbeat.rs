use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dcron_core::cluster::{ClusterName, Clock, NodeId};
use dcron_core::driver::Logger;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::registry::MembershipRegistry;

/// Heartbeat loop configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between renewals.
    pub interval: Duration,
}

impl HeartbeatConfig {
    /// Renew twice per lease so one missed tick does not evict the node.
    pub fn from_lease(lease: Duration) -> Self {
        Self {
            interval: lease / 2,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from_lease(dcron_core::driver::DEFAULT_TIMEOUT)
    }
}

/// Periodic renewal of one node's membership entry.
pub struct HeartbeatLoop {
    registry: Arc<MembershipRegistry>,
    cluster: ClusterName,
    node_id: NodeId,
    config: HeartbeatConfig,
    logger: Arc<dyn Logger>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
}

impl HeartbeatLoop {
    /// Create a new heartbeat loop.
    pub fn new(
        registry: Arc<MembershipRegistry>,
        cluster: ClusterName,
        node_id: NodeId,
        config: HeartbeatConfig,
        logger: Arc<dyn Logger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            cluster,
            node_id,
            config,
            logger,
            clock,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the loop onto the runtime.
    pub fn spawn(self) -> HeartbeatHandle {
        let token = CancellationToken::new();
        let running = self.running.clone();
        // Flip before spawning so the handle reports running immediately.
        running.store(true, Ordering::SeqCst);

        let shutdown = token.clone();
        let handle = tokio::spawn(async move {
            self.run(shutdown).await;
        });

        HeartbeatHandle {
            token,
            handle,
            running,
        }
    }

    /// Run the heartbeat loop until `shutdown` is cancelled.
    ///
    /// The first renewal happens one interval after the call; registration
    /// has already written the entry.
    pub async fn run(&self, shutdown: CancellationToken) {
        self.running.store(true, Ordering::SeqCst);

        let period = self.config.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        let interval_str = format!("{:?}", period);
        self.logger.debug(
            "Heartbeat loop started",
            &[("node_id", &self.node_id), ("interval", &interval_str)],
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                _ = interval.tick() => {
                    // An in-flight renewal is abandoned on shutdown.
                    let result = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        result = self.send_heartbeat() => result,
                    };

                    match result {
                        Ok(()) => {
                            if consecutive_failures > 0 {
                                self.logger.info(
                                    "Heartbeat renewal recovered",
                                    &[("node_id", &self.node_id), ("failures", &consecutive_failures)],
                                );
                            }
                            consecutive_failures = 0;
                        }
                        Err(e) => {
                            consecutive_failures += 1;
                            self.logger.warn(
                                "Heartbeat renewal failed, retrying next tick",
                                &[
                                    ("node_id", &self.node_id),
                                    ("failures", &consecutive_failures),
                                    ("error", &e),
                                ],
                            );
                        }
                    }
                }
            }
        }

        self.logger
            .debug("Heartbeat loop shutting down", &[("node_id", &self.node_id)]);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Send one renewal.
    async fn send_heartbeat(&self) -> dcron_core::Result<()> {
        self.registry
            .renew(&self.cluster, &self.node_id, self.clock.now())
            .await
    }
}

/// Handle to a spawned heartbeat loop.
///
/// Dropping the handle cancels the loop without waiting for it.
pub struct HeartbeatHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

impl HeartbeatHandle {
    /// Check if the loop is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cancel the loop and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Err(e) = (&mut self.handle).await {
            if e.is_panic() {
                tracing::error!(error = %e, "Heartbeat task panicked");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
