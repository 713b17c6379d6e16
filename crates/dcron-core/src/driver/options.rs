use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{Clock, SystemClock};
use crate::error::{DcronError, Result};

use super::logger::{Logger, TracingLogger};

/// Default lease duration.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Smallest lease that still yields a non-zero renewal period.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(2);

/// Option passed to `Driver::init`.
#[derive(Clone)]
pub enum DriverOption {
    /// Lease duration; the renewal period is half of it.
    Timeout(Duration),
    /// Logging collaborator.
    Logger(Arc<dyn Logger>),
    /// Time source for lease arithmetic.
    Clock(Arc<dyn Clock>),
}

impl std::fmt::Debug for DriverOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout(d) => f.debug_tuple("Timeout").field(d).finish(),
            Self::Logger(_) => f.write_str("Logger(..)"),
            Self::Clock(_) => f.write_str("Clock(..)"),
        }
    }
}

/// Lease duration option.
pub fn timeout(duration: Duration) -> DriverOption {
    DriverOption::Timeout(duration)
}

/// Logger option.
pub fn logger(logger: impl Logger) -> DriverOption {
    DriverOption::Logger(Arc::new(logger))
}

/// Clock option.
pub fn clock(clock: impl Clock) -> DriverOption {
    DriverOption::Clock(Arc::new(clock))
}

/// Options resolved against their defaults.
#[derive(Clone)]
pub struct DriverOptions {
    pub timeout: Duration,
    pub logger: Arc<dyn Logger>,
    pub clock: Arc<dyn Clock>,
}

impl DriverOptions {
    /// Apply options in order; later options win.
    pub fn resolve(options: impl IntoIterator<Item = DriverOption>) -> Result<Self> {
        let mut resolved = Self::default();
        for option in options {
            match option {
                DriverOption::Timeout(d) => {
                    if d < MIN_TIMEOUT {
                        return Err(DcronError::Config(format!(
                            "timeout must be at least {:?}, got {:?}",
                            MIN_TIMEOUT, d
                        )));
                    }
                    resolved.timeout = d;
                }
                DriverOption::Logger(l) => resolved.logger = l,
                DriverOption::Clock(c) => resolved.clock = c,
            }
        }
        Ok(resolved)
    }

    /// Period of the heartbeat loop.
    pub fn renewal_period(&self) -> Duration {
        self.timeout / 2
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            logger: Arc::new(TracingLogger),
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for DriverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverOptions")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
