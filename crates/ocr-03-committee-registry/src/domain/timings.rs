//! # Protocol Timings
//!
//! Operational intervals of the pacemaker and round drivers. They only
//! affect liveness under a given network delay bound; safety never depends
//! on their values. Timings are part of the offchain configuration and are
//! hashed into the config digest, so all members run with the same values.

use super::errors::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Interval and rotation parameters for one committee.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolTimings {
    /// Epoch deadline without a delivered report before a new epoch is requested.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub delta_progress: Duration,

    /// Rebroadcast interval for a pending new-epoch request.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub delta_resend: Duration,

    /// Pause between the start of two consecutive rounds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub delta_round: Duration,

    /// Extra wait for late observations once a quorum has arrived.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub delta_grace: Duration,

    /// Deadline for a round to reach an attested report.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub round_timeout: Duration,

    /// Rounds a leader may run per epoch (`r_max`).
    pub max_rounds_per_epoch: u8,

    /// Offset of the leader rotation.
    pub leader_offset: u8,

    /// Offset of the transmitter rotation.
    pub transmitter_offset: u8,
}

impl Default for ProtocolTimings {
    fn default() -> Self {
        Self {
            delta_progress: Duration::from_secs(8),
            delta_resend: Duration::from_secs(2),
            delta_round: Duration::from_secs(1),
            delta_grace: Duration::from_millis(300),
            round_timeout: Duration::from_secs(3),
            max_rounds_per_epoch: 10,
            leader_offset: 0,
            transmitter_offset: 0,
        }
    }
}

impl ProtocolTimings {
    /// Check the interval constraints.
    pub fn validate(&self) -> RegistryResult<()> {
        let named = [
            ("delta_progress", self.delta_progress),
            ("delta_resend", self.delta_resend),
            ("delta_round", self.delta_round),
            ("delta_grace", self.delta_grace),
            ("round_timeout", self.round_timeout),
        ];
        if let Some((name, _)) = named.iter().find(|(_, d)| d.is_zero()) {
            return Err(RegistryError::InvalidTimings(format!("{name} must be non-zero")));
        }

        if self.max_rounds_per_epoch == 0 {
            return Err(RegistryError::InvalidTimings(
                "max_rounds_per_epoch must be at least 1".into(),
            ));
        }

        // A leader must get at least one full round before being suspected
        if self.delta_progress <= self.delta_round + self.round_timeout {
            return Err(RegistryError::InvalidTimings(format!(
                "delta_progress ({:?}) must exceed delta_round + round_timeout ({:?})",
                self.delta_progress,
                self.delta_round + self.round_timeout
            )));
        }

        if self.delta_grace >= self.round_timeout {
            return Err(RegistryError::InvalidTimings(format!(
                "delta_grace ({:?}) must be shorter than round_timeout ({:?})",
                self.delta_grace, self.round_timeout
            )));
        }

        Ok(())
    }

    /// Canonical byte encoding hashed into the config digest.
    ///
    /// Durations are whole milliseconds, big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 * 8 + 3);
        for d in [
            self.delta_progress,
            self.delta_resend,
            self.delta_round,
            self.delta_grace,
            self.round_timeout,
        ] {
            let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
            out.extend_from_slice(&millis.to_be_bytes());
        }
        out.push(self.max_rounds_per_epoch);
        out.push(self.leader_offset);
        out.push(self.transmitter_offset);
        out
    }
}
