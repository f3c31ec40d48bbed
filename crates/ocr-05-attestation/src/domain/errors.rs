//! Error types for attestation.

use ocr_02_observation_signing::SigningError;
use shared_types::{ConfigDigest, OracleId};
use thiserror::Error;

/// Attestation errors.
///
/// Per-signature variants reject that signature only; `QuorumNotReached`
/// abandons the round.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttestationError {
    #[error("quorum not reached: got {got}, required {required}")]
    QuorumNotReached { got: usize, required: usize },

    #[error("signature is over a different report")]
    ReportMismatch,

    #[error("invalid report signature from {signer}: {source}")]
    InvalidSignature {
        signer: OracleId,
        source: SigningError,
    },

    #[error("duplicate signature from {0}")]
    DuplicateSigner(OracleId),

    #[error("signer {0} is not a committee member")]
    UnknownSigner(OracleId),

    #[error("report config {actual} does not match committee {expected}")]
    ConfigMismatch {
        expected: ConfigDigest,
        actual: ConfigDigest,
    },

    #[error("malformed attested report: {0}")]
    Malformed(String),
}

/// Result type for attestation operations.
pub type AttestationResult<T> = Result<T, AttestationError>;
