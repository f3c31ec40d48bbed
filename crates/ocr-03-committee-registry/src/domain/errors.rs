//! Error types for the committee registry.

use shared_types::{ConfigDigest, OracleId};
use thiserror::Error;

/// Committee registry errors.
///
/// All of these are configuration problems. At runtime an
/// `UnknownConfigDigest` halts the affected protocol instance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No configuration is known for this digest.
    #[error("unknown config digest: {0}")]
    UnknownConfigDigest(ConfigDigest),

    /// Committee size or fault threshold is out of bounds.
    #[error("invalid committee: {reason}")]
    InvalidCommittee { reason: String },

    /// Two oracles share a key or address.
    #[error("duplicate {field} for {oracle}")]
    DuplicateIdentity {
        field: &'static str,
        oracle: OracleId,
    },

    /// Timing parameters violate their constraints.
    #[error("invalid timings: {0}")]
    InvalidTimings(String),

    /// The advertised digest does not match the committee contents.
    #[error("config digest mismatch: advertised {advertised}, computed {computed}")]
    DigestMismatch {
        advertised: ConfigDigest,
        computed: ConfigDigest,
    },

    /// A configuration older than the current one was offered.
    #[error("stale config: current count {current}, offered {offered}")]
    StaleConfig { current: u64, offered: u64 },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
