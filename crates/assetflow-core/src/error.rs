//! Error metadata shared by every assetflow error type.
//!
//! Each crate owns its own `thiserror` enum. They all implement
//! [`ErrorMetadata`] so the pipeline can decide whether to retry, which code
//! to report in a batch result, and at which level to log, without knowing
//! the concrete type.

use std::fmt::Display;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a transient backend failure
    Warn,
    /// Error level - for unexpected failures or exhausted retries
    Error,
}

/// Describes how an error should be classified and reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Emit a tracing event for `err` at the level it asks for.
pub fn log_error<E>(err: &E, context: &str)
where
    E: ErrorMetadata + Display + ?Sized,
{
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, error_code = code, "{}", context),
        LogLevel::Warn => tracing::warn!(error = %err, error_code = code, "{}", context),
        LogLevel::Error => tracing::error!(error = %err, error_code = code, "{}", context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    impl ErrorMetadata for Boom {
        fn error_code(&self) -> &'static str {
            "BOOM"
        }

        fn is_recoverable(&self) -> bool {
            true
        }

        fn log_level(&self) -> LogLevel {
            LogLevel::Warn
        }
    }

    #[test]
    fn test_metadata_through_trait_object() {
        let err: Box<dyn ErrorMetadata> = Box::new(Boom);
        assert_eq!(err.error_code(), "BOOM");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_log_error_does_not_panic_without_subscriber() {
        log_error(&Boom, "operation failed");
    }
}
