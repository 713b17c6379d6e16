use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use console::style;
use dcron::prelude::*;
use dcron_core::config::StoreBackend;
use dcron_runtime::store;
use tracing::{info, warn};

/// Join a cluster and stay registered until Ctrl-C.
#[derive(Parser)]
pub struct RunCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "dcron.toml")]
    pub config: String,

    /// Cluster name (overrides config).
    #[arg(long)]
    pub cluster: Option<String>,

    /// Lease duration in milliseconds (overrides config).
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Development mode: verbose logging and in-memory store.
    #[arg(long)]
    pub dev: bool,
}

impl RunCommand {
    /// Execute the run command.
    pub async fn execute(self) -> Result<()> {
        let mut config = super::load_config(&self.config)?;
        self.apply_overrides(&mut config);

        let log_level = if self.dev {
            "debug"
        } else {
            config.observability.log_level.as_str()
        };
        super::init_tracing(log_level, config.observability.json);

        println!();
        println!(
            "  {} v{}",
            style("dcron").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!();

        let store = store::from_config(&config.store).await?;
        let driver = ZSetDriver::from_arc(store)
            .with_cleanup_on_renew(config.cluster.cleanup_on_renew);
        driver.init(&config.cluster.name, config.cluster.driver_options())?;

        let lease = driver.lease()?;
        driver.start(&Context::with_timeout(lease)).await?;

        println!(
            "  {} Joined cluster {} as {}",
            style("●").green().bold(),
            style(driver.cluster_name()?).cyan(),
            style(driver.node_id()?).bold()
        );
        println!(
            "  {} Lease {:?}, backend {}",
            style("●").dim(),
            lease,
            driver.store().backend_name()
        );
        println!();

        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
        };
        watch_membership(&driver, lease, ctrl_c).await;

        driver.stop(&Context::with_timeout(lease)).await?;
        println!("\n  {} Left cluster", style("●").dim());

        Ok(())
    }

    fn apply_overrides(&self, config: &mut DcronConfig) {
        if let Some(cluster) = &self.cluster {
            config.cluster.name = cluster.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.cluster.timeout_ms = timeout_ms;
        }
        if self.dev {
            config.store.backend = StoreBackend::Memory;
        }
    }
}

/// Log membership changes once per renewal period until `shutdown` resolves.
async fn watch_membership(
    driver: &ZSetDriver,
    lease: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut ticker = tokio::time::interval(lease / 2);
    let mut known = BTreeSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                match driver.get_nodes(&Context::with_timeout(lease)).await {
                    Ok(nodes) => {
                        let current: BTreeSet<String> = nodes.into_iter().collect();
                        let (joined, left) = diff_members(&known, &current);
                        for node in &joined {
                            info!(node_id = %node, "Node joined");
                        }
                        for node in &left {
                            info!(node_id = %node, "Node left");
                        }
                        if !joined.is_empty() || !left.is_empty() {
                            info!(count = current.len(), "Cluster membership changed");
                        }
                        known = current;
                    }
                    Err(e) => warn!(error = %e, "Failed to list nodes"),
                }
            }
        }
    }
}

/// Members added to and removed from `previous`.
fn diff_members(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let joined = current.difference(previous).cloned().collect();
    let left = previous.difference(current).cloned().collect();
    (joined, left)
}
