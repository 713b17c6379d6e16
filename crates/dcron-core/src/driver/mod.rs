mod logger;
mod options;

pub use logger::{render_fields, LogFields, LogLevel, Logger, TracingLogger};
pub use options::{
    clock, logger, timeout, DriverOption, DriverOptions, DEFAULT_TIMEOUT, MIN_TIMEOUT,
};

use futures::future::BoxFuture;

use crate::cluster::NodeId;
use crate::context::Context;
use crate::error::Result;

/// Membership driver contract.
///
/// A driver registers the local process under a cluster name, keeps that
/// registration alive while running, and lists every peer whose registration
/// has not expired. The scheduler partitions jobs over the returned list.
pub trait Driver: Send + Sync {
    /// One-time setup: cluster name, identity, options.
    fn init(&self, cluster_name: &str, options: Vec<DriverOption>) -> Result<()>;

    /// Identity generated at `init`.
    fn node_id(&self) -> Result<NodeId>;

    /// Register and start renewing.
    fn start<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<()>>;

    /// Stop renewing and deregister.
    fn stop<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<()>>;

    /// Identities of every live node in the cluster.
    fn get_nodes<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<Vec<String>>>;
}
