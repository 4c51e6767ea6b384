//! Oracle error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// Credentials absent. Fatal: must not be papered over by fallback pricing.
    #[error("Missing oracle credentials: {0}")]
    MissingCredentials(String),

    #[error("Oracle timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed oracle output: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Configuration errors abort the signal instead of degrading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingCredentials(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "config_error",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Malformed(_) => "malformed",
        }
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
