//! Deterministic rotation over the committee.
//!
//! Leader and transmitter selection use the same rule with independent
//! offsets, so every honest node derives the same member from shared
//! inputs without exchanging messages.

use serde::{Deserialize, Serialize};
use shared_types::OracleId;

/// `select(counter, n) = (counter + offset) mod n`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation {
    pub offset: u8,
}

impl Rotation {
    pub fn new(offset: u8) -> Self {
        Self { offset }
    }

    /// Pick a member index for `counter` in a committee of `n`.
    ///
    /// `n` must be non-zero; committee validation guarantees it.
    pub fn select(&self, counter: u64, n: usize) -> OracleId {
        let n = n.max(1) as u64;
        let index = (counter % n + u64::from(self.offset) % n) % n;
        OracleId(index as u8)
    }
}
