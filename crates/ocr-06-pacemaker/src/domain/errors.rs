//! Error types for the protocol loop.

use ocr_04_report_aggregation::AggregationError;
use ocr_05_attestation::AttestationError;
use shared_types::OracleId;
use thiserror::Error;

/// Protocol errors.
///
/// Everything except `Fatal` rejects a single message and is expected
/// under normal network jitter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Wrong config digest, epoch or round, or a replay.
    #[error("stale message: {0}")]
    StaleMessage(&'static str),

    /// Bytes that do not decode to a protocol message.
    #[error("undecodable message: {0}")]
    Decode(String),

    /// Sender is not a committee member.
    #[error("unknown sender {0}")]
    UnknownSender(OracleId),

    /// Message only the epoch leader may send.
    #[error("message from {actual}, epoch leader is {expected}")]
    NotLeader { expected: OracleId, actual: OracleId },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    /// A signing capability refused or failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The instance cannot continue.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl ProtocolError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolError::Fatal(_))
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
