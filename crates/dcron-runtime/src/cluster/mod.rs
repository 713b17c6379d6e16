mod driver;
mod heartbeat;
mod registry;

pub use driver::ZSetDriver;
pub use heartbeat::{HeartbeatConfig, HeartbeatHandle, HeartbeatLoop};
pub use registry::MembershipRegistry;
