//! Assetflow Infrastructure Library
//!
//! Shared infrastructure used by the services and the CLI:
//! - Telemetry initialization (tracing subscriber)
//! - Retry policy with exponential backoff and jitter

pub mod retry;
pub mod telemetry;

// Re-export commonly used types
pub use retry::{call_with_timeout, compute_backoff_ms, retry_transient, RetryPolicy};
pub use telemetry::{init_telemetry, LogFormat, TelemetryConfig};
