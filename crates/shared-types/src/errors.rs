//! # Error Types
//!
//! Round-level failure reasons shared between the protocol loop, the
//! transmission scheduler and telemetry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a round stopped without producing (or transmitting) a report.
///
/// None of these are fatal: the pacemaker simply moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum AbandonReason {
    /// Fewer than `f+1` valid observations arrived in time.
    #[error("insufficient observations")]
    InsufficientObservations,

    /// Fewer than `2f+1` matching report signatures arrived in time.
    #[error("quorum not reached")]
    QuorumNotReached,

    /// The epoch changed underneath the round.
    #[error("epoch changed")]
    EpochChanged,
}

impl AbandonReason {
    /// Stable label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AbandonReason::InsufficientObservations => "insufficient_observations",
            AbandonReason::QuorumNotReached => "quorum_not_reached",
            AbandonReason::EpochChanged => "epoch_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_cover_every_reason() {
        let labels: Vec<_> = [
            AbandonReason::InsufficientObservations,
            AbandonReason::QuorumNotReached,
            AbandonReason::EpochChanged,
        ]
        .iter()
        .map(AbandonReason::as_label)
        .collect();
        assert_eq!(
            labels,
            ["insufficient_observations", "quorum_not_reached", "epoch_changed"]
        );
    }
}
