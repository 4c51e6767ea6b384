//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oracle error: {0}")]
    Oracle(#[from] surge_oracle::OracleError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] surge_pricing::PricingError),

    #[error("Reconciler error: {0}")]
    Reconciler(#[from] surge_reconciler::ReconcilerError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] surge_dashboard::DashboardError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] surge_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
