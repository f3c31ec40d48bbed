//! # Core Protocol Entities
//!
//! ## Clusters
//!
//! - **Configuration**: `ConfigDigest`, `OracleId`
//! - **Logical Time**: `Epoch`, `Round`, `EpochRound`, `ReportTimestamp`
//! - **Round Payloads**: `Query`, `Observation`
//! - **Chain**: `Address`, `OffchainPublicKey`, `TxHash`

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Ed25519 public key used to verify observation signatures.
pub type OffchainPublicKey = [u8; 32];

/// Leader tenure counter.
pub type Epoch = u32;

/// Agreement attempt counter within an epoch.
pub type Round = u8;

// =============================================================================
// CLUSTER A: CONFIGURATION
// =============================================================================

/// Fingerprint binding a committee configuration.
///
/// Every protocol message carries the digest of the configuration it was
/// produced under; messages with any other digest are dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ConfigDigest(pub [u8; 32]);

impl ConfigDigest {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigDigest({})", &self.to_hex()[..16])
    }
}

impl From<[u8; 32]> for ConfigDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Index of a committee member (`0..n-1`), stable for one configuration.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct OracleId(pub u8);

impl OracleId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oracle-{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: LOGICAL TIME
// =============================================================================

/// `(epoch, round)` pair with lexicographic ordering.
///
/// Field order matters: the derived `Ord` compares `epoch` first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EpochRound {
    pub epoch: Epoch,
    pub round: Round,
}

impl EpochRound {
    pub fn new(epoch: Epoch, round: Round) -> Self {
        Self { epoch, round }
    }

    /// Position of this round in the global sequence of possible rounds.
    pub fn sequence(&self) -> u64 {
        (u64::from(self.epoch) << 8) | u64::from(self.round)
    }
}

impl fmt::Display for EpochRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}r{}", self.epoch, self.round)
    }
}

/// Logical identity of a round: `{ConfigDigest, Epoch, Round}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportTimestamp {
    pub config_digest: ConfigDigest,
    pub epoch: Epoch,
    pub round: Round,
}

impl ReportTimestamp {
    pub fn new(config_digest: ConfigDigest, epoch: Epoch, round: Round) -> Self {
        Self {
            config_digest,
            epoch,
            round,
        }
    }

    pub fn epoch_round(&self) -> EpochRound {
        EpochRound::new(self.epoch, self.round)
    }

    pub fn sequence(&self) -> u64 {
        self.epoch_round().sequence()
    }

    /// Whether `self` is strictly later than `other` in `(epoch, round)` order.
    ///
    /// The digest is not part of the ordering.
    pub fn is_newer_than(&self, other: &ReportTimestamp) -> bool {
        self.epoch_round() > other.epoch_round()
    }
}

impl fmt::Display for ReportTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.epoch_round(),
            &self.config_digest.to_hex()[..8]
        )
    }
}

// =============================================================================
// CLUSTER C: ROUND PAYLOADS
// =============================================================================

/// Leader-issued round input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Query(pub Vec<u8>);

impl Query {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Query {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// An oracle's raw local measurement for a round.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Observation(pub Vec<u8>);

impl Observation {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Observation {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// CLUSTER D: CHAIN
// =============================================================================

/// On-chain transaction hash returned by a successful submission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}
