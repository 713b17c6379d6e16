use std::time::Duration;

use thiserror::Error;

/// Boxed error raised by a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for dcron operations.
#[derive(Error, Debug)]
pub enum DcronError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Driver not initialized: call init before {0}")]
    NotInitialized(&'static str),

    #[error("Store error: {0}")]
    Store(#[source] BoxError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl DcronError {
    /// Wrap a backend error, keeping it as the error source.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Cancelled | Self::DeadlineExceeded(_)
        )
    }
}

/// Result type alias using DcronError.
pub type Result<T> = std::result::Result<T, DcronError>;
