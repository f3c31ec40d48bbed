//! Driven ports (Outbound dependencies)
//!
//! Signing is delegated to these capabilities so the protocol never has to
//! hold private key material itself. A node may back them with an HSM, a
//! remote signer or, as in [`crate::adapters::keys`], in-process keys.

use crate::domain::entities::{EcdsaSignature, ObservationSignature, OffchainPublicKey};
use shared_types::{Address, Hash};
use thiserror::Error;

/// Failure reported by a signing capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The backing key store could not be reached.
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// The key store refused to sign.
    #[error("signing rejected: {0}")]
    Rejected(String),
}

/// Produces Ed25519 signatures over observation wire hashes.
pub trait ObservationSigner: Send + Sync {
    /// Sign a 32-byte observation digest.
    fn sign_observation(&self, digest: &Hash) -> Result<ObservationSignature, SignerError>;

    /// Public key the committee has registered for this signer.
    fn public_key(&self) -> OffchainPublicKey;
}

/// Produces recoverable secp256k1 signatures over report digests.
pub trait ReportSigner: Send + Sync {
    /// Sign a 32-byte report digest.
    fn sign_report(&self, digest: &Hash) -> Result<EcdsaSignature, SignerError>;

    /// On-chain address the signature recovers to.
    fn signer_address(&self) -> Address;
}
