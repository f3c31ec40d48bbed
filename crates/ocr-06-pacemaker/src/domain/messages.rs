//! # Protocol Messages
//!
//! The closed set of messages exchanged between oracles. Every message
//! travels inside a [`WireMessage`] that names the configuration it was
//! produced under.

use super::errors::{ProtocolError, ProtocolResult};
use ocr_02_observation_signing::{AttributedSignedObservation, EcdsaSignature, SignedObservation};
use ocr_05_attestation::AttestedReport;
use serde::{Deserialize, Serialize};
use shared_types::{ConfigDigest, Epoch, Hash, Query, ReportTimestamp};

/// Upper bound on an encoded message; larger inputs are not decoded.
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Protocol message variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    /// Request (or support) a move to `epoch`.
    NewEpoch { epoch: Epoch },

    /// Leader asks followers to observe.
    ObserveReq {
        timestamp: ReportTimestamp,
        query: Query,
    },

    /// Follower's signed observation, sent to the leader.
    Observe {
        timestamp: ReportTimestamp,
        signed_observation: SignedObservation,
    },

    /// Leader asks followers to sign the report built from `observations`.
    ReportReq {
        timestamp: ReportTimestamp,
        query: Query,
        observations: Vec<AttributedSignedObservation>,
    },

    /// Follower's signature over the report digest, sent to the leader.
    Report {
        timestamp: ReportTimestamp,
        report_digest: Hash,
        signature: EcdsaSignature,
    },

    /// Leader announces the attested report.
    Final {
        timestamp: ReportTimestamp,
        attested_report: AttestedReport,
    },

    /// Any oracle re-broadcasts a final report it accepted.
    FinalEcho {
        timestamp: ReportTimestamp,
        attested_report: AttestedReport,
    },
}

impl ProtocolMessage {
    /// Variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolMessage::NewEpoch { .. } => "new_epoch",
            ProtocolMessage::ObserveReq { .. } => "observe_req",
            ProtocolMessage::Observe { .. } => "observe",
            ProtocolMessage::ReportReq { .. } => "report_req",
            ProtocolMessage::Report { .. } => "report",
            ProtocolMessage::Final { .. } => "final",
            ProtocolMessage::FinalEcho { .. } => "final_echo",
        }
    }

    /// Round the message refers to, if any.
    pub fn timestamp(&self) -> Option<&ReportTimestamp> {
        match self {
            ProtocolMessage::NewEpoch { .. } => None,
            ProtocolMessage::ObserveReq { timestamp, .. }
            | ProtocolMessage::Observe { timestamp, .. }
            | ProtocolMessage::ReportReq { timestamp, .. }
            | ProtocolMessage::Report { timestamp, .. }
            | ProtocolMessage::Final { timestamp, .. }
            | ProtocolMessage::FinalEcho { timestamp, .. } => Some(timestamp),
        }
    }
}

/// Envelope carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub config_digest: ConfigDigest,
    pub body: ProtocolMessage,
}

impl WireMessage {
    pub fn new(config_digest: ConfigDigest, body: ProtocolMessage) -> Self {
        Self {
            config_digest,
            body,
        }
    }

    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::Decode(format!(
                "message of {} bytes exceeds {MAX_MESSAGE_SIZE}",
                bytes.len()
            )));
        }
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Check the envelope against the running configuration.
    ///
    /// Messages carrying a timestamp must agree with the envelope digest.
    pub fn open(self, expected: &ConfigDigest) -> ProtocolResult<ProtocolMessage> {
        if &self.config_digest != expected {
            return Err(ProtocolError::StaleMessage("config digest mismatch"));
        }
        if let Some(ts) = self.body.timestamp() {
            if &ts.config_digest != expected {
                return Err(ProtocolError::StaleMessage("timestamp digest mismatch"));
            }
        }
        Ok(self.body)
    }
}
