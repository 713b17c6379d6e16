pub mod cluster;
pub mod store;
pub mod testing;

pub use cluster::{HeartbeatConfig, HeartbeatHandle, HeartbeatLoop, MembershipRegistry, ZSetDriver};
pub use store::{MemoryStore, RedisStore};
