//! # Observation Signatures (Ed25519)
//!
//! Signing goes through an injected [`ObservationSigner`]; verification is a
//! pure function of its inputs.

use super::entities::{ObservationSignature, OffchainPublicKey, SignedObservation};
use super::errors::{SigningError, SigningResult};
use super::wire::ObservationHasher;
use crate::ports::outbound::ObservationSigner;
use ed25519_dalek::{Signature, VerifyingKey};
use shared_types::{Hash, Observation, Query, ReportTimestamp};

impl SignedObservation {
    /// Sign `observation` for the given round and query.
    ///
    /// Fails with `SigningFailed` if the capability errors.
    pub fn sign(
        timestamp: &ReportTimestamp,
        query: &Query,
        observation: Observation,
        signer: &dyn ObservationSigner,
    ) -> SigningResult<Self> {
        let digest = ObservationHasher::new().hash(timestamp, query, &observation);
        let signature = signer
            .sign_observation(&digest)
            .map_err(|e| SigningError::SigningFailed(e.to_string()))?;

        Ok(Self {
            observation,
            signature,
        })
    }

    /// Check the signature against the observer's registered key.
    pub fn verify(
        &self,
        timestamp: &ReportTimestamp,
        query: &Query,
        public_key: &OffchainPublicKey,
    ) -> SigningResult<()> {
        self.verify_with(&mut ObservationHasher::new(), timestamp, query, public_key)
    }

    /// Same as [`verify`](Self::verify), reusing a caller-owned hasher.
    pub fn verify_with(
        &self,
        hasher: &mut ObservationHasher,
        timestamp: &ReportTimestamp,
        query: &Query,
        public_key: &OffchainPublicKey,
    ) -> SigningResult<()> {
        let digest = hasher.hash(timestamp, query, &self.observation);
        verify_digest(&digest, &self.signature, public_key)
    }
}

/// Verify an Ed25519 signature over a 32-byte digest.
pub fn verify_digest(
    digest: &Hash,
    signature: &ObservationSignature,
    public_key: &OffchainPublicKey,
) -> SigningResult<()> {
    let key = VerifyingKey::from_bytes(public_key).map_err(|_| SigningError::InvalidPublicKey)?;
    let sig = Signature::from_bytes(&signature.0);

    key.verify_strict(digest, &sig)
        .map_err(|_| SigningError::InvalidSignature)
}
