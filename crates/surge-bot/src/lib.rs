//! Demand-responsive pricing service.
//!
//! Wires the pipeline together:
//! - Signal intake and view telemetry
//! - Periodic reconciler (demand aggregation, pending signals)
//! - Significance evaluation
//! - Pricing decision engine with oracle, fallback and validation
//! - Publication board, audit log and optional HTTP dashboard

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, OracleConfig, OracleKind, PersistenceConfig, TelemetryConfig};
pub use error::{AppError, AppResult};
