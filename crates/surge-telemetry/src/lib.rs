//! Prometheus metrics and structured logging for surge.
//!
//! - Prometheus metrics for signals, oracle calls, validation, publication
//! - Structured JSON logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
