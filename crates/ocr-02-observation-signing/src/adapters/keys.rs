//! # In-Process Key Pairs
//!
//! Key material held in memory. Suitable for the local devnet and tests;
//! production nodes inject their own signer capabilities.

use crate::domain::ecdsa::{address_from_pubkey, sign_digest};
use crate::domain::entities::{EcdsaSignature, ObservationSignature, OffchainPublicKey};
use crate::ports::outbound::{ObservationSigner, ReportSigner, SignerError};
use ed25519_dalek::Signer;
use rand::RngCore;
use shared_types::{Address, Hash};
use zeroize::Zeroize;

/// Ed25519 key pair for observation signing.
pub struct OffchainKeypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl OffchainKeypair {
    /// Generate a fresh key pair from the thread RNG.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }
}

impl ObservationSigner for OffchainKeypair {
    fn sign_observation(&self, digest: &Hash) -> Result<ObservationSignature, SignerError> {
        Ok(ObservationSignature(self.signing_key.sign(digest).to_bytes()))
    }

    fn public_key(&self) -> OffchainPublicKey {
        self.signing_key.verifying_key().to_bytes()
    }
}

/// secp256k1 key pair for report signing.
pub struct OnchainKeypair {
    signing_key: k256::ecdsa::SigningKey,
    address: Address,
}

impl OnchainKeypair {
    pub fn generate() -> Self {
        Self::from_signing_key(k256::ecdsa::SigningKey::random(&mut rand::thread_rng()))
    }

    pub fn from_signing_key(signing_key: k256::ecdsa::SigningKey) -> Self {
        let address = address_from_pubkey(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }
}

impl ReportSigner for OnchainKeypair {
    fn sign_report(&self, digest: &Hash) -> Result<EcdsaSignature, SignerError> {
        sign_digest(&self.signing_key, digest).map_err(|e| SignerError::Rejected(e.to_string()))
    }

    fn signer_address(&self) -> Address {
        self.address
    }
}
