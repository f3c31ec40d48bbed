//! Transmission Service
//!
//! Consumes the newest attested report delivered by the protocol and, when
//! this node is the selected transmitter, submits it with retries. At most
//! one transmission is pending at a time; a newer report aborts it.

#[cfg(test)]
mod tests;

use crate::domain::config::TransmissionConfig;
use crate::domain::errors::{TransmitError, TransmitResult};
use crate::domain::selection::{decide, TransmissionDecision};
use crate::ports::outbound::ContractTransmitter;
use ocr_03_committee_registry::CommitteeConfig;
use ocr_05_attestation::AttestedReport;
use shared_bus::{OracleEvent, TelemetrySink};
use shared_types::{OracleId, ReportTimestamp, TxHash};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Dependencies for TransmissionScheduler
pub struct TransmissionDependencies {
    pub oracle_id: OracleId,
    pub committee: Arc<CommitteeConfig>,
    pub contract: Arc<dyn ContractTransmitter>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub config: TransmissionConfig,
}

/// How a transmission for one report ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmissionOutcome {
    Transmitted(TxHash),
    /// The contract already held this round or a later one.
    AlreadyTransmitted { latest: ReportTimestamp },
    Failed(TransmitError),
    /// `max_attempts` transient failures in a row.
    GaveUp { attempts: u32 },
}

struct Context {
    oracle_id: OracleId,
    committee: Arc<CommitteeConfig>,
    contract: Arc<dyn ContractTransmitter>,
    telemetry: Arc<dyn TelemetrySink>,
    config: TransmissionConfig,
}

struct Pending {
    timestamp: ReportTimestamp,
    handle: JoinHandle<TransmissionOutcome>,
}

/// Per-node transmission scheduler for one committee configuration.
pub struct TransmissionScheduler {
    ctx: Arc<Context>,
    latest_seen: Option<ReportTimestamp>,
    pending: Option<Pending>,
}

impl TransmissionScheduler {
    pub fn new(deps: TransmissionDependencies) -> TransmitResult<Self> {
        deps.config.validate()?;
        Ok(Self {
            ctx: Arc::new(Context {
                oracle_id: deps.oracle_id,
                committee: deps.committee,
                contract: deps.contract,
                telemetry: deps.telemetry,
                config: deps.config,
            }),
            latest_seen: None,
            pending: None,
        })
    }

    /// Round of the transmission still in flight, if any.
    pub fn pending(&self) -> Option<ReportTimestamp> {
        self.pending
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.timestamp)
    }

    /// Follow `reports` until `shutdown` flips to `true` or the report
    /// source goes away.
    pub async fn run(
        mut self,
        mut reports: watch::Receiver<Option<AttestedReport>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(oracle = %self.ctx.oracle_id, "transmission scheduler starting");
        loop {
            let current = reports.borrow_and_update().clone();
            if let Some(report) = current {
                self.on_report(report);
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                changed = reports.changed() => {
                    if changed.is_err() {
                        debug!(oracle = %self.ctx.oracle_id, "report source closed");
                        break;
                    }
                }
            }
        }

        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
        info!(oracle = %self.ctx.oracle_id, "transmission scheduler stopped");
    }

    fn on_report(&mut self, report: AttestedReport) {
        let timestamp = *report.timestamp();
        if self
            .latest_seen
            .is_some_and(|seen| !timestamp.is_newer_than(&seen))
        {
            trace!(oracle = %self.ctx.oracle_id, %timestamp, "report is not newer, ignoring");
            return;
        }
        self.latest_seen = Some(timestamp);
        self.supersede(timestamp);

        match decide(self.ctx.oracle_id, &timestamp, &self.ctx.committee, None) {
            TransmissionDecision::Transmit => {
                let handle = tokio::spawn(transmit_with_retry(
                    Arc::clone(&self.ctx),
                    report,
                    timestamp,
                ));
                self.pending = Some(Pending { timestamp, handle });
            }
            TransmissionDecision::NotSelected { transmitter } => {
                debug!(
                    oracle = %self.ctx.oracle_id,
                    %timestamp,
                    %transmitter,
                    "another member transmits this report"
                );
            }
            TransmissionDecision::AlreadyTransmitted { .. } => {}
        }
    }

    /// Abort the pending transmission in favour of `by`.
    fn supersede(&mut self, by: ReportTimestamp) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.handle.is_finished() {
            return;
        }
        pending.handle.abort();
        info!(
            oracle = %self.ctx.oracle_id,
            timestamp = %pending.timestamp,
            %by,
            "pending transmission superseded"
        );
        self.ctx.telemetry.emit(OracleEvent::TransmissionSuperseded {
            oracle: self.ctx.oracle_id,
            timestamp: pending.timestamp,
            by,
        });
    }
}

/// `Transmit(attestedReport)` with retries.
async fn transmit_with_retry(
    ctx: Arc<Context>,
    report: AttestedReport,
    timestamp: ReportTimestamp,
) -> TransmissionOutcome {
    let oracle = ctx.oracle_id;
    let bytes = report.to_bytes();
    let mut attempts = 0u32;

    loop {
        let latest = match ctx.contract.latest_transmitted().await {
            Ok(latest) => latest,
            Err(e) => {
                debug!(
                    %oracle,
                    %timestamp,
                    error = %e,
                    "cannot read contract state, transmitting anyway"
                );
                None
            }
        };
        if let TransmissionDecision::AlreadyTransmitted { latest } =
            decide(oracle, &timestamp, &ctx.committee, latest.as_ref())
        {
            info!(%oracle, %timestamp, %latest, "contract already holds a fresher report");
            ctx.telemetry.emit(OracleEvent::TransmissionSuperseded {
                oracle,
                timestamp,
                by: latest,
            });
            return TransmissionOutcome::AlreadyTransmitted { latest };
        }

        attempts += 1;
        ctx.telemetry.emit(OracleEvent::TransmissionAttempted {
            oracle,
            timestamp,
            attempt: attempts,
        });

        match ctx.contract.transmit(&bytes).await {
            Ok(tx_hash) => {
                info!(%oracle, %timestamp, %tx_hash, attempt = attempts, "report transmitted");
                ctx.telemetry.emit(OracleEvent::TransmissionSucceeded {
                    oracle,
                    timestamp,
                    tx_hash,
                });
                return TransmissionOutcome::Transmitted(tx_hash);
            }
            Err(error) => {
                let permanent = error.is_permanent();
                ctx.telemetry.emit(OracleEvent::TransmissionFailed {
                    oracle,
                    timestamp,
                    attempt: attempts,
                    permanent,
                    error: error.to_string(),
                });

                if permanent {
                    warn!(%oracle, %timestamp, %error, "transmission failed permanently");
                    return TransmissionOutcome::Failed(error);
                }
                if ctx.config.exhausted(attempts) {
                    warn!(%oracle, %timestamp, attempts, "giving up on transmission");
                    return TransmissionOutcome::GaveUp { attempts };
                }

                let delay = ctx.config.backoff(attempts - 1);
                debug!(%oracle, %timestamp, %error, ?delay, "transmission failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
