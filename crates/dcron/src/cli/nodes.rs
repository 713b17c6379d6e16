use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use console::style;
use dcron::prelude::*;
use dcron_runtime::store;
use serde::Serialize;

/// List live nodes without joining the cluster.
#[derive(Parser)]
pub struct NodesCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "dcron.toml")]
    pub config: String,

    /// Cluster name (overrides config).
    #[arg(long)]
    pub cluster: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct NodeRow {
    node_id: String,
    last_renewal: DateTime<Utc>,
    age_ms: i64,
}

impl NodeRow {
    fn new(entry: MemberEntry, now: DateTime<Utc>) -> Self {
        Self {
            age_ms: entry.age(now).num_milliseconds(),
            last_renewal: entry.last_renewal,
            node_id: entry.node_id.into_string(),
        }
    }
}

impl NodesCommand {
    /// Execute the nodes command.
    pub async fn execute(self) -> Result<()> {
        let mut config = super::load_config(&self.config)?;
        if let Some(cluster) = &self.cluster {
            config.cluster.name = cluster.clone();
        }
        super::init_tracing("warn", config.observability.json);

        let store = store::from_config(&config.store).await?;
        let driver = ZSetDriver::from_arc(store);
        driver.init(&config.cluster.name, config.cluster.driver_options())?;

        let entries = driver
            .members(&Context::with_timeout(driver.lease()?))
            .await?;
        let now = Utc::now();
        let rows: Vec<NodeRow> = entries
            .into_iter()
            .map(|entry| NodeRow::new(entry, now))
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!(
            "  {} {} live node(s) in {}",
            style("●").green().bold(),
            rows.len(),
            style(&config.cluster.name).cyan()
        );
        for row in &rows {
            println!("    {}  {}ms ago", row.node_id, row.age_ms);
        }

        Ok(())
    }
}
