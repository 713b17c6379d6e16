//! dcron - cluster membership for distributed cron schedulers
//!
//! Nodes sharing a cluster name register in a sorted set keyed by their last
//! renewal time. Each node renews every half lease and lists the members that
//! renewed within the lease; the scheduler partitions jobs over that list.

pub use dcron_core;
pub use dcron_runtime;

pub use dcron_core::{
    Context, DcronConfig, DcronError, Driver, DriverOption, DriverState, MemberEntry, NodeId,
    Result,
};
pub use dcron_runtime::{MemoryStore, RedisStore, ZSetDriver};

/// Driver options.
pub mod options {
    pub use dcron_core::driver::{clock, logger, timeout, DEFAULT_TIMEOUT, MIN_TIMEOUT};
}

/// Common imports for driver users.
pub mod prelude {
    pub use chrono::{DateTime, Utc};

    pub use dcron_core::cluster::{ClusterName, Clock, SystemClock};
    pub use dcron_core::driver::{LogLevel, Logger, TracingLogger};
    pub use dcron_core::store::SortedSetStore;

    pub use crate::options;
    pub use crate::{
        Context, DcronConfig, DcronError, Driver, DriverOption, DriverState, MemberEntry,
        MemoryStore, NodeId, RedisStore, Result, ZSetDriver,
    };
}
