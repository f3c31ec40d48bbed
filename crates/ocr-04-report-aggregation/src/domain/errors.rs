//! Error types for report aggregation.

use ocr_01_numeric_codec::CodecError;
use ocr_02_observation_signing::SigningError;
use shared_types::{OracleId, ReportTimestamp};
use thiserror::Error;

/// Aggregation errors.
///
/// Per-observation variants exclude that observation from the round. Only
/// `InsufficientObservations` and `Cancelled` end a round.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("insufficient observations: got {got}, required {required}")]
    InsufficientObservations { got: usize, required: usize },

    #[error("observer {0} is not a committee member")]
    UnknownObserver(OracleId),

    #[error("duplicate observation from {0}")]
    DuplicateObserver(OracleId),

    #[error("invalid signature from {observer}: {source}")]
    InvalidSignature {
        observer: OracleId,
        source: SigningError,
    },

    #[error("invalid value from {observer}: {source}")]
    InvalidValue {
        observer: OracleId,
        source: CodecError,
    },

    #[error("observation for {actual}, expected {expected}")]
    TimestampMismatch {
        expected: ReportTimestamp,
        actual: ReportTimestamp,
    },

    #[error("aggregation cancelled")]
    Cancelled,

    #[error("malformed report: {0}")]
    MalformedReport(String),
}

impl AggregationError {
    /// Short label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AggregationError::InsufficientObservations { .. } => "insufficient_observations",
            AggregationError::UnknownObserver(_) => "unknown_observer",
            AggregationError::DuplicateObserver(_) => "duplicate_observer",
            AggregationError::InvalidSignature { .. } => "invalid_signature",
            AggregationError::InvalidValue { .. } => "invalid_value",
            AggregationError::TimestampMismatch { .. } => "timestamp_mismatch",
            AggregationError::Cancelled => "cancelled",
            AggregationError::MalformedReport(_) => "malformed_report",
        }
    }
}

/// Result type for aggregation operations.
pub type AggregationResult<T> = Result<T, AggregationError>;
