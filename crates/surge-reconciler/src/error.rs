//! Reconciler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Signal failed validation at intake.
    #[error("Invalid signal: {0}")]
    InvalidSignal(#[from] surge_core::CoreError),

    #[error("Store error: {0}")]
    Store(#[from] surge_store::StoreError),

    #[error("Detector error: {0}")]
    Detector(#[from] surge_detector::DetectorError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] surge_pricing::PricingError),
}

impl ReconcilerError {
    /// Whether operators must act before pricing can resume.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Pricing(surge_pricing::PricingError::Configuration(_))
        )
    }
}

pub type ReconcilerResult<T> = Result<T, ReconcilerError>;
