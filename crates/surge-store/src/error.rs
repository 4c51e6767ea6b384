//! Store error types.

use crate::namespace::Namespace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt value at {namespace}/{key}: {source}")]
    Decode {
        namespace: Namespace,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Decode errors are recoverable by falling back to defaults.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
