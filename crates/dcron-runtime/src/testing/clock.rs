use chrono::{DateTime, Utc};
use dcron_core::cluster::Clock;
use tokio::time::Instant;

/// Wall clock driven by tokio's timer.
///
/// Under `#[tokio::test(start_paused = true)]` it advances with virtual time,
/// so lease arithmetic follows `tokio::time::sleep` instead of the real clock.
/// Share one instance (via clones) between every driver of a test.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin_wall: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    /// Anchor the clock at the current time.
    pub fn new() -> Self {
        Self {
            origin_wall: Utc::now(),
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin_wall + elapsed
    }
}
