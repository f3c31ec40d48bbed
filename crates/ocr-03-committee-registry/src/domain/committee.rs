//! # Committee Configuration
//!
//! A validated committee and the digest that binds it to one on-chain
//! configuration.
//!
//! ## Digest Format
//!
//! ```text
//! keccak256( chain_id[8, BE]
//!         || contract_address[20]
//!         || config_count[8, BE]
//!         || n[1] || for each oracle:
//!              offchain_public_key[32] || onchain_signer[20] || transmitter[20]
//!              || len(peer_id)[8, BE] || peer_id
//!         || f[1]
//!         || len(offchain_config)[8, BE] || offchain_config )
//! ```
//!
//! with the first two bytes overwritten by [`CONFIG_DIGEST_PREFIX`].

use super::errors::{RegistryError, RegistryResult};
use super::identity::OracleIdentity;
use super::rotation::Rotation;
use super::timings::ProtocolTimings;
use serde::{Deserialize, Serialize};
use shared_types::{
    keccak256, Address, ConfigDigest, Epoch, OffchainPublicKey, OracleId, ReportTimestamp,
};
use std::collections::HashSet;

/// Largest supported committee.
pub const MAX_ORACLES: usize = 31;

/// Digest-format prefix written over the first two hash bytes.
pub const CONFIG_DIGEST_PREFIX: [u8; 2] = [0x00, 0x01];

/// Compute the digest binding a committee to an on-chain configuration.
pub fn config_digest(
    chain_id: u64,
    contract_address: &Address,
    config_count: u64,
    oracles: &[OracleIdentity],
    f: u8,
    offchain_config: &[u8],
) -> ConfigDigest {
    let mut buf = Vec::with_capacity(64 + oracles.len() * 96 + offchain_config.len());
    buf.extend_from_slice(&chain_id.to_be_bytes());
    buf.extend_from_slice(contract_address);
    buf.extend_from_slice(&config_count.to_be_bytes());
    buf.push(oracles.len() as u8);
    for oracle in oracles {
        buf.extend_from_slice(&oracle.offchain_public_key);
        buf.extend_from_slice(&oracle.onchain_signer);
        buf.extend_from_slice(&oracle.transmitter);
        buf.extend_from_slice(&(oracle.peer_id.len() as u64).to_be_bytes());
        buf.extend_from_slice(oracle.peer_id.as_bytes());
    }
    buf.push(f);
    buf.extend_from_slice(&(offchain_config.len() as u64).to_be_bytes());
    buf.extend_from_slice(offchain_config);

    let mut digest = keccak256(&buf);
    digest[..2].copy_from_slice(&CONFIG_DIGEST_PREFIX);
    ConfigDigest(digest)
}

/// One committee configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Digest advertised for this configuration.
    pub digest: ConfigDigest,
    pub chain_id: u64,
    pub contract_address: Address,
    /// Monotonic on-chain configuration counter.
    pub config_count: u64,
    /// Members, indexed by `OracleId`.
    pub oracles: Vec<OracleIdentity>,
    /// Maximum number of faulty members tolerated.
    pub f: u8,
    pub timings: ProtocolTimings,
}

impl CommitteeConfig {
    /// Build and validate a configuration, computing its digest.
    pub fn new(
        chain_id: u64,
        contract_address: Address,
        config_count: u64,
        oracles: Vec<OracleIdentity>,
        f: u8,
        timings: ProtocolTimings,
    ) -> RegistryResult<Self> {
        let mut config = Self {
            digest: ConfigDigest::default(),
            chain_id,
            contract_address,
            config_count,
            oracles,
            f,
            timings,
        };
        config.validate_members()?;
        config.timings.validate()?;
        config.digest = config.compute_digest();
        Ok(config)
    }

    /// Recompute the digest from the configuration contents.
    pub fn compute_digest(&self) -> ConfigDigest {
        config_digest(
            self.chain_id,
            &self.contract_address,
            self.config_count,
            &self.oracles,
            self.f,
            &self.timings.to_bytes(),
        )
    }

    /// Full validation, including the advertised digest.
    pub fn validate(&self) -> RegistryResult<()> {
        self.validate_members()?;
        self.timings.validate()?;

        let computed = self.compute_digest();
        if computed != self.digest {
            return Err(RegistryError::DigestMismatch {
                advertised: self.digest,
                computed,
            });
        }
        Ok(())
    }

    fn validate_members(&self) -> RegistryResult<()> {
        let n = self.oracles.len();
        if n == 0 || n > MAX_ORACLES {
            return Err(RegistryError::InvalidCommittee {
                reason: format!("committee size {n} outside 1..={MAX_ORACLES}"),
            });
        }
        let bound = 3 * usize::from(self.f);
        if bound >= n {
            return Err(RegistryError::InvalidCommittee {
                reason: format!("f={} requires more than {bound} oracles, have {n}", self.f),
            });
        }

        let mut offchain = HashSet::with_capacity(n);
        let mut signers = HashSet::with_capacity(n);
        let mut transmitters = HashSet::with_capacity(n);
        for (i, oracle) in self.oracles.iter().enumerate() {
            let id = OracleId(i as u8);
            if !offchain.insert(oracle.offchain_public_key) {
                return Err(RegistryError::DuplicateIdentity {
                    field: "offchain public key",
                    oracle: id,
                });
            }
            if !signers.insert(oracle.onchain_signer) {
                return Err(RegistryError::DuplicateIdentity {
                    field: "onchain signer",
                    oracle: id,
                });
            }
            if !transmitters.insert(oracle.transmitter) {
                return Err(RegistryError::DuplicateIdentity {
                    field: "transmitter",
                    oracle: id,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Committee Queries
    // =========================================================================

    /// Committee size `n`.
    pub fn n(&self) -> usize {
        self.oracles.len()
    }

    /// Minimum decoded observations for a report (`f+1`).
    pub fn min_observations(&self) -> usize {
        usize::from(self.f) + 1
    }

    /// Signatures or observations needed for a quorum (`2f+1`).
    pub fn quorum(&self) -> usize {
        2 * usize::from(self.f) + 1
    }

    pub fn contains(&self, id: OracleId) -> bool {
        id.index() < self.n()
    }

    pub fn oracle(&self, id: OracleId) -> Option<&OracleIdentity> {
        self.oracles.get(id.index())
    }

    pub fn offchain_key(&self, id: OracleId) -> Option<&OffchainPublicKey> {
        self.oracle(id).map(|o| &o.offchain_public_key)
    }

    /// Member whose on-chain signer is `address`.
    pub fn signer_index(&self, address: &Address) -> Option<OracleId> {
        self.oracles
            .iter()
            .position(|o| &o.onchain_signer == address)
            .map(|i| OracleId(i as u8))
    }

    /// Member whose peer identifier is `peer_id`.
    pub fn peer_index(&self, peer_id: &str) -> Option<OracleId> {
        self.oracles
            .iter()
            .position(|o| o.peer_id == peer_id)
            .map(|i| OracleId(i as u8))
    }

    pub fn leader_rotation(&self) -> Rotation {
        Rotation::new(self.timings.leader_offset)
    }

    pub fn transmitter_rotation(&self) -> Rotation {
        Rotation::new(self.timings.transmitter_offset)
    }

    /// Leader for `epoch`.
    pub fn leader(&self, epoch: Epoch) -> OracleId {
        self.leader_rotation().select(u64::from(epoch), self.n())
    }

    /// Member expected to transmit the report for `timestamp`.
    pub fn transmitter(&self, timestamp: &ReportTimestamp) -> OracleId {
        self.transmitter_rotation()
            .select(timestamp.sequence(), self.n())
    }
}
