pub mod cluster;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod store;

pub use cluster::{ClusterName, DriverState, MemberEntry, NodeId};
pub use config::DcronConfig;
pub use context::Context;
pub use driver::{Driver, DriverOption, DriverOptions, LogLevel, Logger};
pub use error::{DcronError, Result};
pub use store::{ScoredMember, SortedSetStore};
