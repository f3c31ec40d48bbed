//! # Domain Entities
//!
//! Signed observations and the signature containers that travel on the wire.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

pub use shared_types::OffchainPublicKey;
use shared_types::{Observation, OracleId};

// =============================================================================
// Observation Signatures (Ed25519)
// =============================================================================

/// Detached Ed25519 signature over an observation wire hash.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationSignature(#[serde_as(as = "Bytes")] pub [u8; 64]);

impl fmt::Debug for ObservationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservationSignature({}..)", hex::encode(&self.0[..8]))
    }
}

/// An observation plus a detached signature over its wire message.
///
/// Equality is exact byte equality of both fields. It is used to spot
/// duplicate broadcasts and carries no security meaning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedObservation {
    pub observation: Observation,
    pub signature: ObservationSignature,
}

/// A signed observation annotated with the oracle that claims to have made it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributedSignedObservation {
    pub signed_observation: SignedObservation,
    pub observer: OracleId,
}

impl AttributedSignedObservation {
    pub fn new(signed_observation: SignedObservation, observer: OracleId) -> Self {
        Self {
            signed_observation,
            observer,
        }
    }
}

// =============================================================================
// Report Signatures (secp256k1)
// =============================================================================

/// ECDSA signature on the secp256k1 curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Wire length of `r || s || v`.
    pub const LEN: usize = 65;

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self { r, s, v: bytes[64] }
    }
}
