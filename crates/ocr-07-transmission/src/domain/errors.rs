//! Transmission errors.

use thiserror::Error;

/// On-chain submission failure, classified by whether a retry can help.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransmitError {
    /// Network or RPC trouble; retried with backoff.
    #[error("transient transmit error: {0}")]
    Transient(String),

    /// The contract rejected the report (e.g. config mismatch); not retried.
    #[error("permanent transmit error: {0}")]
    Permanent(String),

    /// The scheduler configuration is unusable.
    #[error("invalid transmission config: {0}")]
    InvalidConfig(String),
}

impl TransmitError {
    pub fn is_permanent(&self) -> bool {
        !matches!(self, TransmitError::Transient(_))
    }
}

/// Result type for transmission operations.
pub type TransmitResult<T> = Result<T, TransmitError>;
