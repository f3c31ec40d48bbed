//! # Observation Wire Framing
//!
//! The signed payload for an observation is
//!
//! ```text
//! SHA256( config_digest[32]
//!      || epoch[4, BE]
//!      || round[1]
//!      || len(query)[8, BE]       || query
//!      || len(observation)[8, BE] || observation )
//! ```
//!
//! Both variable-length fields are length-prefixed so bytes cannot migrate
//! from one field into the other without changing the hash.

use sha2::{Digest, Sha256};
use shared_types::{Hash, Observation, Query, ReportTimestamp};

/// Fixed-size prefix: digest + epoch + round.
const HEADER_LEN: usize = 32 + 4 + 1;

/// Reusable framing buffer.
///
/// One hasher per worker keeps allocations out of the hot path. A freshly
/// constructed hasher produces exactly the same digests as a reused one.
#[derive(Debug, Default)]
pub struct ObservationHasher {
    scratch: Vec<u8>,
}

impl ObservationHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame and hash one `(timestamp, query, observation)` triple.
    pub fn hash(
        &mut self,
        timestamp: &ReportTimestamp,
        query: &Query,
        observation: &Observation,
    ) -> Hash {
        self.scratch.clear();
        self.scratch
            .reserve(HEADER_LEN + 16 + query.as_bytes().len() + observation.len());

        self.scratch
            .extend_from_slice(timestamp.config_digest.as_bytes());
        self.scratch.extend_from_slice(&timestamp.epoch.to_be_bytes());
        self.scratch.push(timestamp.round);
        self.scratch
            .extend_from_slice(&(query.as_bytes().len() as u64).to_be_bytes());
        self.scratch.extend_from_slice(query.as_bytes());
        self.scratch
            .extend_from_slice(&(observation.len() as u64).to_be_bytes());
        self.scratch.extend_from_slice(observation.as_bytes());

        Sha256::digest(&self.scratch).into()
    }

    /// The framed bytes of the last call to [`hash`](Self::hash).
    pub fn last_message(&self) -> &[u8] {
        &self.scratch
    }
}

/// Hash with a throwaway buffer.
pub fn observation_wire_hash(
    timestamp: &ReportTimestamp,
    query: &Query,
    observation: &Observation,
) -> Hash {
    ObservationHasher::new().hash(timestamp, query, observation)
}
