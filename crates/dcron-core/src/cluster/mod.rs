mod clock;
mod node;
mod state;

pub use clock::{Clock, SystemClock};
pub use node::{score_to_time, time_to_score, ClusterName, MemberEntry, NodeId};
pub use state::DriverState;
