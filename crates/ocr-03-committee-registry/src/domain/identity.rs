//! Oracle identities.

use serde::{Deserialize, Serialize};
use shared_types::{Address, OffchainPublicKey};
use std::fmt;

/// Everything the committee knows about one member.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OracleIdentity {
    /// Ed25519 key verifying this oracle's observations.
    pub offchain_public_key: OffchainPublicKey,
    /// Address its report signatures must recover to.
    pub onchain_signer: Address,
    /// Account it submits transactions from.
    pub transmitter: Address,
    /// Transport-level peer identifier.
    pub peer_id: String,
}

impl fmt::Debug for OracleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleIdentity")
            .field("peer_id", &self.peer_id)
            .field("offchain", &hex::encode(&self.offchain_public_key[..4]))
            .field("signer", &format!("0x{}", hex::encode(self.onchain_signer)))
            .finish()
    }
}
