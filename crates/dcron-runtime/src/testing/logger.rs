use std::sync::{Arc, Mutex};

use dcron_core::driver::{render_fields, LogFields, LogLevel, Logger};

/// A recorded log call.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message.
    pub message: String,
    /// Fields rendered as `k=v` pairs.
    pub fields: String,
}

/// Logger that records every call for later assertions.
#[derive(Debug, Clone, Default)]
pub struct CaptureLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CaptureLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Records at exactly `level`.
    pub fn records_at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    /// Check if a record at `level` contains `needle` in its message.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records_at(level)
            .iter()
            .any(|r| r.message.contains(needle))
    }
}

impl Logger for CaptureLogger {
    fn log(&self, level: LogLevel, message: &str, fields: LogFields<'_>) {
        let record = LogRecord {
            level,
            message: message.to_string(),
            fields: render_fields(fields),
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}
