//! Transmitter selection.

use ocr_03_committee_registry::CommitteeConfig;
use shared_types::{OracleId, ReportTimestamp};

/// `SelectTransmitter(round, committee)`
pub fn select_transmitter(timestamp: &ReportTimestamp, committee: &CommitteeConfig) -> OracleId {
    committee.transmitter(timestamp)
}

/// What this node should do with a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransmissionDecision {
    /// This node is the selected transmitter.
    Transmit,
    /// Another member is responsible.
    NotSelected { transmitter: OracleId },
    /// The contract already holds this round or a later one.
    AlreadyTransmitted { latest: ReportTimestamp },
}

/// Decide whether `me` submits the report for `timestamp`.
pub fn decide(
    me: OracleId,
    timestamp: &ReportTimestamp,
    committee: &CommitteeConfig,
    latest_on_chain: Option<&ReportTimestamp>,
) -> TransmissionDecision {
    if let Some(latest) = latest_on_chain {
        if !timestamp.is_newer_than(latest) {
            return TransmissionDecision::AlreadyTransmitted { latest: *latest };
        }
    }
    let transmitter = select_transmitter(timestamp, committee);
    if transmitter == me {
        TransmissionDecision::Transmit
    } else {
        TransmissionDecision::NotSelected { transmitter }
    }
}
