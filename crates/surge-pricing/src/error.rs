//! Pricing error types.

use surge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Oracle cannot be used at all (e.g. missing credentials).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The new price could not be persisted; nothing was published.
    #[error("Failed to persist pricing state: {0}")]
    Persist(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid pricing config: {0}")]
    InvalidConfig(String),
}

pub type PricingResult<T> = Result<T, PricingError>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publication channel closed")]
    Closed,

    #[error("Publication failed: {0}")]
    Backend(String),
}

pub type PublishResult<T> = Result<T, PublishError>;
