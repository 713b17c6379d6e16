//! Test doubles for drivers and stores.

mod clock;
mod logger;
mod store;

pub use clock::TokioClock;
pub use logger::{CaptureLogger, LogRecord};
pub use store::FlakyStore;
