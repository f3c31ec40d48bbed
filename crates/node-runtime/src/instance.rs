//! # Protocol Instance
//!
//! One pacemaker loop plus one transmission scheduler, bound to a single
//! committee configuration. Reports flow from the loop to the scheduler
//! through a `watch` channel; both stop on the same shutdown signal.

use ocr_02_observation_signing::{ObservationSigner, ReportSigner, VerificationPool};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::{DataSource, MedianPlugin};
use ocr_05_attestation::AttestedReport;
use ocr_06_pacemaker::{OracleProtocol, ProtocolDependencies, ProtocolError, ProtocolResult};
use ocr_07_transmission::{
    ContractTransmitter, TransmissionConfig, TransmissionDependencies, TransmissionScheduler,
    TransmitError,
};
use shared_bus::{InboundMessage, PeerTransport, TelemetrySink};
use shared_types::{ConfigDigest, OracleId};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything one instance runs against.
pub struct InstanceDependencies {
    pub oracle_id: OracleId,
    pub committee: Arc<CommitteeConfig>,
    pub transport: Arc<dyn PeerTransport>,
    pub inbound: mpsc::Receiver<InboundMessage>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub observation_signer: Arc<dyn ObservationSigner>,
    pub report_signer: Arc<dyn ReportSigner>,
    pub data_source: Arc<dyn DataSource>,
    pub contract: Arc<dyn ContractTransmitter>,
    pub transmission: TransmissionConfig,
    pub plugin: MedianPlugin,
    pub pool: Arc<VerificationPool>,
}

/// A running protocol instance.
pub struct ProtocolInstance {
    oracle_id: OracleId,
    config_digest: ConfigDigest,
    reports: watch::Receiver<Option<AttestedReport>>,
    shutdown: watch::Sender<bool>,
    protocol: JoinHandle<ProtocolResult<()>>,
    transmission: JoinHandle<()>,
}

impl ProtocolInstance {
    /// Start both halves on the current runtime.
    pub fn spawn(deps: InstanceDependencies) -> Result<Self, TransmitError> {
        let config_digest = deps.committee.digest;
        let scheduler = TransmissionScheduler::new(TransmissionDependencies {
            oracle_id: deps.oracle_id,
            committee: Arc::clone(&deps.committee),
            contract: deps.contract,
            telemetry: Arc::clone(&deps.telemetry),
            config: deps.transmission,
        })?;

        let protocol = OracleProtocol::new(ProtocolDependencies {
            oracle_id: deps.oracle_id,
            committee: deps.committee,
            transport: deps.transport,
            inbound: deps.inbound,
            telemetry: deps.telemetry,
            observation_signer: deps.observation_signer,
            report_signer: deps.report_signer,
            data_source: deps.data_source,
            plugin: deps.plugin,
            pool: deps.pool,
        });

        let reports = protocol.reports();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let transmission = tokio::spawn(scheduler.run(reports.clone(), shutdown_rx.clone()));
        let protocol = tokio::spawn(protocol.run(shutdown_rx));

        info!(oracle = %deps.oracle_id, %config_digest, "protocol instance started");
        Ok(Self {
            oracle_id: deps.oracle_id,
            config_digest,
            reports,
            shutdown,
            protocol,
            transmission,
        })
    }

    pub fn oracle_id(&self) -> OracleId {
        self.oracle_id
    }

    pub fn config_digest(&self) -> ConfigDigest {
        self.config_digest
    }

    /// Newest report this instance delivered.
    pub fn reports(&self) -> watch::Receiver<Option<AttestedReport>> {
        self.reports.clone()
    }

    /// Whether the protocol loop has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.protocol.is_finished()
    }

    /// Signal shutdown and wait for both tasks.
    ///
    /// Returns how the protocol loop ended.
    pub async fn stop(self) -> ProtocolResult<()> {
        // Receivers may already be gone if the loop halted
        let _ = self.shutdown.send(true);

        if let Err(e) = self.transmission.await {
            warn!(oracle = %self.oracle_id, error = %e, "transmission task panicked");
        }
        let result = match self.protocol.await {
            Ok(result) => result,
            Err(e) => Err(ProtocolError::Fatal(format!("protocol task panicked: {e}"))),
        };
        info!(
            oracle = %self.oracle_id,
            config_digest = %self.config_digest,
            ok = result.is_ok(),
            "protocol instance stopped"
        );
        result
    }
}
