//! # Instance Supervisor
//!
//! Keeps exactly one protocol instance running per oracle, for the current
//! committee configuration.
//!
//! ```text
//! config change ──▶ registry.resolve(digest) ──┬─ Ok  ──▶ stop old, spawn new
//!                                              └─ Err ──▶ stop old, ProtocolHalted
//! ```
//!
//! An unresolvable digest stops the affected instance only; the supervisor
//! keeps running and picks up the next valid configuration.

use crate::instance::ProtocolInstance;
use ocr_03_committee_registry::{CommitteeConfig, ConfigRegistry, RegistryError};
use ocr_07_transmission::TransmitError;
use shared_bus::{OracleEvent, TelemetrySink};
use shared_types::{ConfigDigest, OracleId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// How often a halted instance is looked for between config changes.
const REAP_INTERVAL: Duration = Duration::from_millis(500);

/// Errors starting an instance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisorError {
    /// This node's keys are not part of the committee.
    #[error("not a member of committee {0}")]
    NotAMember(ConfigDigest),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("transmission setup failed: {0}")]
    Transmission(#[from] TransmitError),
}

/// Builds the instance for one oracle and one committee.
pub trait InstanceFactory: Send + Sync {
    fn spawn(&self, committee: Arc<CommitteeConfig>) -> Result<ProtocolInstance, SupervisorError>;
}

/// Restarts the protocol whenever the committee configuration changes.
pub struct InstanceSupervisor {
    oracle_id: OracleId,
    registry: Arc<ConfigRegistry>,
    factory: Arc<dyn InstanceFactory>,
    telemetry: Arc<dyn TelemetrySink>,
    current: Option<ProtocolInstance>,
    running: watch::Sender<Option<ConfigDigest>>,
}

impl InstanceSupervisor {
    pub fn new(
        oracle_id: OracleId,
        registry: Arc<ConfigRegistry>,
        factory: Arc<dyn InstanceFactory>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let (running, _) = watch::channel(None);
        Self {
            oracle_id,
            registry,
            factory,
            telemetry,
            current: None,
            running,
        }
    }

    /// Digest of the running instance, `None` while idle or halted.
    pub fn running(&self) -> watch::Receiver<Option<ConfigDigest>> {
        self.running.subscribe()
    }

    /// Follow `changes` until shutdown.
    pub async fn run(
        mut self,
        mut changes: mpsc::Receiver<ConfigDigest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut reap = tokio::time::interval(REAP_INTERVAL);
        reap.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                change = changes.recv() => match change {
                    Some(digest) => self.on_config_change(digest).await,
                    None => {
                        debug!(oracle = %self.oracle_id, "config change source closed");
                        break;
                    }
                },
                _ = reap.tick() => self.reap_halted().await,
            }
        }

        self.stop_current().await;
        info!(oracle = %self.oracle_id, "supervisor stopped");
    }

    async fn on_config_change(&mut self, digest: ConfigDigest) {
        if self.current.as_ref().map(ProtocolInstance::config_digest) == Some(digest) {
            debug!(oracle = %self.oracle_id, config_digest = %digest, "config unchanged");
            return;
        }

        let committee = match self.registry.resolve(&digest) {
            Ok(committee) => committee,
            Err(e) => {
                self.stop_current().await;
                self.halted(digest, e.to_string());
                return;
            }
        };

        self.stop_current().await;
        match self.factory.spawn(committee) {
            Ok(instance) => {
                self.running.send_replace(Some(instance.config_digest()));
                self.current = Some(instance);
            }
            Err(SupervisorError::NotAMember(digest)) => {
                info!(oracle = %self.oracle_id, config_digest = %digest, "not in committee, idle");
            }
            Err(e) => self.halted(digest, e.to_string()),
        }
    }

    async fn stop_current(&mut self) {
        if let Some(instance) = self.current.take() {
            self.running.send_replace(None);
            if let Err(e) = instance.stop().await {
                warn!(oracle = %self.oracle_id, error = %e, "instance ended with error");
            }
        }
    }

    /// Collect an instance whose loop exited on a fatal condition.
    async fn reap_halted(&mut self) {
        if self.current.as_ref().is_some_and(ProtocolInstance::is_finished) {
            self.stop_current().await;
        }
    }

    fn halted(&self, config_digest: ConfigDigest, reason: String) {
        error!(oracle = %self.oracle_id, %config_digest, %reason, "protocol instance halted");
        self.telemetry.emit(OracleEvent::ProtocolHalted {
            oracle: self.oracle_id,
            config_digest,
            reason,
        });
    }
}
