mod nodes;
mod run;

pub use nodes::NodesCommand;
pub use run::RunCommand;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dcron::DcronConfig;
use tracing_subscriber::EnvFilter;

/// dcron - cluster membership for distributed cron
#[derive(Parser)]
#[command(name = "dcron")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Join a cluster and keep this node registered until Ctrl-C.
    Run(RunCommand),

    /// List the live nodes of a cluster without joining it.
    Nodes(NodesCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let _ = dotenvy::dotenv();

        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Nodes(cmd) => cmd.execute().await,
        }
    }
}

/// Load the configuration file, or defaults when it does not exist.
fn load_config(path: &str) -> Result<DcronConfig> {
    if !Path::new(path).exists() {
        return Ok(DcronConfig::default());
    }
    Ok(DcronConfig::from_file(path)?)
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
