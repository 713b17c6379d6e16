use std::fmt::Write as _;

/// Severity of a driver log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Key/value pairs attached to a log record.
pub type LogFields<'a> = &'a [(&'static str, &'a dyn std::fmt::Display)];

/// Logging collaborator injected into a driver.
pub trait Logger: Send + Sync + 'static {
    /// Emit one record.
    fn log(&self, level: LogLevel, message: &str, fields: LogFields<'_>);

    fn debug(&self, message: &str, fields: LogFields<'_>) {
        self.log(LogLevel::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: LogFields<'_>) {
        self.log(LogLevel::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: LogFields<'_>) {
        self.log(LogLevel::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: LogFields<'_>) {
        self.log(LogLevel::Error, message, fields);
    }
}

/// Logger that forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: LogFields<'_>) {
        let fields = render_fields(fields);
        match level {
            LogLevel::Debug => tracing::debug!(target: "dcron", fields = %fields, "{}", message),
            LogLevel::Info => tracing::info!(target: "dcron", fields = %fields, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "dcron", fields = %fields, "{}", message),
            LogLevel::Error => tracing::error!(target: "dcron", fields = %fields, "{}", message),
        }
    }
}

/// Render fields as `k=v` pairs separated by spaces.
pub fn render_fields(fields: LogFields<'_>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}={}", key, value);
    }
    out
}
