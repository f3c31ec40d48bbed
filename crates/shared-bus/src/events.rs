//! # Oracle Events
//!
//! Every event the protocol reports to telemetry. Each carries the oracle
//! that emitted it so a single bus can serve a whole local committee.

use serde::{Deserialize, Serialize};
use shared_types::{AbandonReason, ConfigDigest, Epoch, OracleId, ReportTimestamp, TxHash};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    // =========================================================================
    // PACEMAKER
    // =========================================================================
    /// The node switched to a new epoch.
    EpochStarted {
        oracle: OracleId,
        config_digest: ConfigDigest,
        epoch: Epoch,
        leader: OracleId,
    },

    /// A round began under `leader`.
    RoundStarted {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        leader: OracleId,
    },

    /// A round ended without a report.
    RoundAbandoned {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        reason: AbandonReason,
    },

    // =========================================================================
    // REPORT
    // =========================================================================
    /// An attested report was delivered to the transmission side.
    ReportAttested {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        signers: usize,
    },

    /// The leader discarded an observation it received.
    ObservationRejected {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        observer: OracleId,
        reason: String,
    },

    // =========================================================================
    // TRANSMISSION
    // =========================================================================
    /// An on-chain submission was attempted (attempts start at 1).
    TransmissionAttempted {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        attempt: u32,
    },

    TransmissionSucceeded {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        tx_hash: TxHash,
    },

    TransmissionFailed {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        attempt: u32,
        permanent: bool,
        error: String,
    },

    /// A pending transmission was cancelled in favour of a newer report.
    TransmissionSuperseded {
        oracle: OracleId,
        timestamp: ReportTimestamp,
        by: ReportTimestamp,
    },

    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// A protocol instance stopped on a fatal condition.
    ProtocolHalted {
        oracle: OracleId,
        config_digest: ConfigDigest,
        reason: String,
    },
}

impl OracleEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::EpochStarted { .. } | Self::RoundStarted { .. } | Self::RoundAbandoned { .. } => {
                EventTopic::Pacemaker
            }
            Self::ReportAttested { .. } | Self::ObservationRejected { .. } => EventTopic::Report,
            Self::TransmissionAttempted { .. }
            | Self::TransmissionSucceeded { .. }
            | Self::TransmissionFailed { .. }
            | Self::TransmissionSuperseded { .. } => EventTopic::Transmission,
            Self::ProtocolHalted { .. } => EventTopic::Lifecycle,
        }
    }

    /// Oracle that emitted this event.
    #[must_use]
    pub fn oracle(&self) -> OracleId {
        match self {
            Self::EpochStarted { oracle, .. }
            | Self::RoundStarted { oracle, .. }
            | Self::RoundAbandoned { oracle, .. }
            | Self::ReportAttested { oracle, .. }
            | Self::ObservationRejected { oracle, .. }
            | Self::TransmissionAttempted { oracle, .. }
            | Self::TransmissionSucceeded { oracle, .. }
            | Self::TransmissionFailed { oracle, .. }
            | Self::TransmissionSuperseded { oracle, .. }
            | Self::ProtocolHalted { oracle, .. } => *oracle,
        }
    }

    /// Short name used as a metric label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EpochStarted { .. } => "epoch_started",
            Self::RoundStarted { .. } => "round_started",
            Self::RoundAbandoned { .. } => "round_abandoned",
            Self::ReportAttested { .. } => "report_attested",
            Self::ObservationRejected { .. } => "observation_rejected",
            Self::TransmissionAttempted { .. } => "transmission_attempted",
            Self::TransmissionSucceeded { .. } => "transmission_succeeded",
            Self::TransmissionFailed { .. } => "transmission_failed",
            Self::TransmissionSuperseded { .. } => "transmission_superseded",
            Self::ProtocolHalted { .. } => "protocol_halted",
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// All events (no filtering).
    All,
    Pacemaker,
    Report,
    Transmission,
    Lifecycle,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include (empty = all topics).
    pub topics: Vec<EventTopic>,
    /// Emitting oracles to include (empty = all oracles).
    pub oracles: Vec<OracleId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            oracles: Vec::new(),
        }
    }

    /// Restrict the filter to events emitted by `oracles`.
    #[must_use]
    pub fn from_oracles(mut self, oracles: Vec<OracleId>) -> Self {
        self.oracles = oracles;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &OracleEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let oracle_match = self.oracles.is_empty() || self.oracles.contains(&event.oracle());

        topic_match && oracle_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> ReportTimestamp {
        ReportTimestamp::new(ConfigDigest([1; 32]), 2, 3)
    }

    fn round_started(oracle: u8) -> OracleEvent {
        OracleEvent::RoundStarted {
            oracle: OracleId(oracle),
            timestamp: ts(),
            leader: OracleId(0),
        }
    }

    fn succeeded(oracle: u8) -> OracleEvent {
        OracleEvent::TransmissionSucceeded {
            oracle: OracleId(oracle),
            timestamp: ts(),
            tx_hash: TxHash([9; 32]),
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(round_started(0).topic(), EventTopic::Pacemaker);
        assert_eq!(succeeded(0).topic(), EventTopic::Transmission);
        assert_eq!(
            OracleEvent::ProtocolHalted {
                oracle: OracleId(1),
                config_digest: ConfigDigest::default(),
                reason: "x".into(),
            }
            .topic(),
            EventTopic::Lifecycle
        );
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&round_started(3)));
        assert!(EventFilter::topics(vec![EventTopic::All]).matches(&succeeded(1)));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Transmission]);
        assert!(filter.matches(&succeeded(0)));
        assert!(!filter.matches(&round_started(0)));
    }

    #[test]
    fn test_filter_by_oracle() {
        let filter = EventFilter::all().from_oracles(vec![OracleId(2)]);
        assert!(filter.matches(&succeeded(2)));
        assert!(!filter.matches(&succeeded(1)));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(round_started(0).kind(), "round_started");
        assert_eq!(succeeded(0).kind(), "transmission_succeeded");
    }
}
