//! # In-Memory Contract
//!
//! Stand-in for the on-chain aggregator. It accepts an attested report only
//! if the attestation verifies against the current committee and the report
//! is strictly newer than the last one it accepted. Every committee member's
//! transmitter submits to the same instance.

use async_trait::async_trait;
use ocr_01_numeric_codec::{BigInt, NumericCodec};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::Report;
use ocr_05_attestation::AttestedReport;
use ocr_07_transmission::{ContractTransmitter, TransmitError};
use parking_lot::RwLock;
use shared_types::{keccak256, ConfigDigest, ReportTimestamp, TxHash};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why the contract refused a submission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("malformed submission: {0}")]
    Malformed(String),

    #[error("config digest mismatch: contract {expected}, report {actual}")]
    ConfigMismatch {
        expected: ConfigDigest,
        actual: ConfigDigest,
    },

    #[error("attestation rejected: {0}")]
    InvalidAttestation(String),

    #[error("stale report {offered}, contract holds {latest}")]
    Stale {
        latest: ReportTimestamp,
        offered: ReportTimestamp,
    },
}

impl From<ContractError> for TransmitError {
    fn from(e: ContractError) -> Self {
        TransmitError::Permanent(e.to_string())
    }
}

/// One accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub tx_hash: TxHash,
    pub report: Report,
    pub signers: usize,
}

impl Transmission {
    pub fn timestamp(&self) -> &ReportTimestamp {
        &self.report.timestamp
    }
}

struct ContractState {
    committee: Arc<CommitteeConfig>,
    latest: Option<ReportTimestamp>,
    history: Vec<Transmission>,
}

pub struct InMemoryContract {
    state: RwLock<ContractState>,
}

impl InMemoryContract {
    pub fn new(committee: Arc<CommitteeConfig>) -> Self {
        Self {
            state: RwLock::new(ContractState {
                committee,
                latest: None,
                history: Vec::new(),
            }),
        }
    }

    /// Switch to a new committee. The round counter starts over.
    pub fn set_config(&self, committee: Arc<CommitteeConfig>) {
        let mut state = self.state.write();
        info!(config_digest = %committee.digest, "contract configuration updated");
        state.committee = committee;
        state.latest = None;
    }

    pub fn config_digest(&self) -> ConfigDigest {
        self.state.read().committee.digest
    }

    /// Verify and record an attested report.
    pub fn submit(&self, attested_report: &[u8]) -> Result<TxHash, ContractError> {
        let report = AttestedReport::from_bytes(attested_report)
            .map_err(|e| ContractError::Malformed(e.to_string()))?;
        let timestamp = *report.timestamp();

        let mut state = self.state.write();
        if timestamp.config_digest != state.committee.digest {
            return Err(ContractError::ConfigMismatch {
                expected: state.committee.digest,
                actual: timestamp.config_digest,
            });
        }
        if let Some(latest) = state.latest {
            if !timestamp.is_newer_than(&latest) {
                return Err(ContractError::Stale {
                    latest,
                    offered: timestamp,
                });
            }
        }
        report
            .verify(&state.committee)
            .map_err(|e| ContractError::InvalidAttestation(e.to_string()))?;

        let tx_hash = TxHash(keccak256(attested_report));
        debug!(%timestamp, %tx_hash, signers = report.signatures.len(), "report accepted");
        state.latest = Some(timestamp);
        state.history.push(Transmission {
            tx_hash,
            signers: report.signatures.len(),
            report: report.report,
        });
        Ok(tx_hash)
    }

    pub fn latest(&self) -> Option<ReportTimestamp> {
        self.state.read().latest
    }

    /// Median of the newest accepted report.
    pub fn latest_answer(&self, codec: &NumericCodec) -> Option<BigInt> {
        let state = self.state.read();
        state
            .history
            .last()
            .and_then(|t| t.report.median_value(codec).ok())
    }

    pub fn history(&self) -> Vec<Transmission> {
        self.state.read().history.clone()
    }
}

#[async_trait]
impl ContractTransmitter for InMemoryContract {
    async fn transmit(&self, attested_report: &[u8]) -> Result<TxHash, TransmitError> {
        Ok(self.submit(attested_report)?)
    }

    async fn latest_transmitted(&self) -> Result<Option<ReportTimestamp>, TransmitError> {
        Ok(self.latest())
    }
}
