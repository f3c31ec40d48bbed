//! # Signing Errors
//!
//! Error types for observation and report signature operations.

use shared_types::Address;
use thiserror::Error;

/// Errors that can occur while signing or verifying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// The injected signing capability failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature does not verify for this message and key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Public key bytes do not describe a valid curve point.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Recovered signer does not match expected signer
    #[error(
        "Signer mismatch: expected 0x{}, got 0x{}",
        hex::encode(.expected),
        hex::encode(.actual)
    )]
    SignerMismatch { expected: Address, actual: Address },

    /// Verification worker pool could not be created.
    #[error("Verification pool init failed: {0}")]
    PoolInit(String),
}

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;
