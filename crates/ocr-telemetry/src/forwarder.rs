//! # Telemetry Forwarder
//!
//! Consumes [`OracleEvent`]s from the event bus and turns them into
//! Prometheus metrics and log lines. The protocol only ever emits; all
//! aggregation happens here, off the protocol's critical path.

use crate::metrics::{
    CURRENT_EPOCH, EPOCHS_STARTED, OBSERVATIONS_REJECTED, PROTOCOL_HALTS, REPORTS_ATTESTED,
    ROUNDS_ABANDONED, ROUNDS_STARTED, TRANSMISSIONS, TRANSMISSION_LATENCY,
};
use crate::{log_round_event, log_transmission_event};
use shared_bus::{EventFilter, InMemoryEventBus, OracleEvent, Subscription};
use shared_types::{OracleId, ReportTimestamp};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error};

/// Attempts older than this are forgotten if no outcome arrives.
const MAX_IN_FLIGHT: usize = 1024;

/// Bus consumer that drives metrics and logs.
pub struct TelemetryForwarder {
    subscription: Subscription,
    in_flight: HashMap<(OracleId, ReportTimestamp), Instant>,
    forwarded: u64,
}

impl TelemetryForwarder {
    /// Subscribe to every event on `bus`.
    pub fn new(bus: &InMemoryEventBus) -> Self {
        Self::with_filter(bus, EventFilter::all())
    }

    pub fn with_filter(bus: &InMemoryEventBus, filter: EventFilter) -> Self {
        Self {
            subscription: bus.subscribe(filter),
            in_flight: HashMap::new(),
            forwarded: 0,
        }
    }

    /// Events handled so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Forward events until shutdown or until the bus is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = self.subscription.recv() => match event {
                    Some(event) => self.record(&event),
                    None => break,
                },
            }
        }
        debug!(forwarded = self.forwarded, "telemetry forwarder stopped");
    }

    /// Apply one event to metrics and logs.
    pub fn record(&mut self, event: &OracleEvent) {
        self.forwarded += 1;
        match event {
            OracleEvent::EpochStarted {
                oracle,
                config_digest,
                epoch,
                leader,
            } => {
                EPOCHS_STARTED.inc();
                CURRENT_EPOCH
                    .with_label_values(&[&oracle.to_string()])
                    .set(f64::from(*epoch));
                tracing::info!(
                    oracle = %oracle,
                    config_digest = %config_digest,
                    epoch,
                    leader = %leader,
                    "epoch started"
                );
            }
            OracleEvent::RoundStarted {
                oracle,
                timestamp,
                leader,
            } => {
                ROUNDS_STARTED.inc();
                log_round_event!(debug, oracle, timestamp, "round started", leader = %leader);
            }
            OracleEvent::RoundAbandoned {
                oracle,
                timestamp,
                reason,
            } => {
                ROUNDS_ABANDONED.with_label_values(&[reason.as_label()]).inc();
                log_round_event!(info, oracle, timestamp, "round abandoned", reason = %reason);
            }
            OracleEvent::ReportAttested {
                oracle,
                timestamp,
                signers,
            } => {
                REPORTS_ATTESTED.inc();
                log_round_event!(info, oracle, timestamp, "report attested", signers);
            }
            OracleEvent::ObservationRejected {
                oracle,
                timestamp,
                observer,
                reason,
            } => {
                OBSERVATIONS_REJECTED.with_label_values(&[reason.as_str()]).inc();
                log_round_event!(
                    debug,
                    oracle,
                    timestamp,
                    "observation rejected",
                    observer = %observer,
                    reason = %reason
                );
            }
            OracleEvent::TransmissionAttempted {
                oracle,
                timestamp,
                attempt,
            } => {
                if self.in_flight.len() >= MAX_IN_FLIGHT {
                    self.in_flight.clear();
                }
                self.in_flight.insert((*oracle, *timestamp), Instant::now());
                log_transmission_event!(
                    debug,
                    oracle,
                    timestamp,
                    attempt,
                    "transmission attempted"
                );
            }
            OracleEvent::TransmissionSucceeded {
                oracle,
                timestamp,
                tx_hash,
            } => {
                self.observe_latency(*oracle, *timestamp);
                TRANSMISSIONS.with_label_values(&["succeeded"]).inc();
                log_round_event!(info, oracle, timestamp, "report transmitted", tx_hash = %tx_hash);
            }
            OracleEvent::TransmissionFailed {
                oracle,
                timestamp,
                attempt,
                permanent,
                error,
            } => {
                self.observe_latency(*oracle, *timestamp);
                if *permanent {
                    TRANSMISSIONS.with_label_values(&["failed_permanent"]).inc();
                    log_transmission_event!(
                        warn,
                        oracle,
                        timestamp,
                        attempt,
                        "transmission failed permanently",
                        error = %error
                    );
                } else {
                    TRANSMISSIONS.with_label_values(&["failed_transient"]).inc();
                    log_transmission_event!(
                        debug,
                        oracle,
                        timestamp,
                        attempt,
                        "transmission failed, will retry",
                        error = %error
                    );
                }
            }
            OracleEvent::TransmissionSuperseded {
                oracle,
                timestamp,
                by,
            } => {
                self.in_flight.remove(&(*oracle, *timestamp));
                TRANSMISSIONS.with_label_values(&["superseded"]).inc();
                log_round_event!(debug, oracle, timestamp, "transmission superseded", by = %by);
            }
            OracleEvent::ProtocolHalted {
                oracle,
                config_digest,
                reason,
            } => {
                PROTOCOL_HALTS.inc();
                error!(
                    oracle = %oracle,
                    config_digest = %config_digest,
                    reason = %reason,
                    "protocol halted"
                );
            }
        }
    }

    fn observe_latency(&mut self, oracle: OracleId, timestamp: ReportTimestamp) {
        if let Some(started) = self.in_flight.remove(&(oracle, timestamp)) {
            TRANSMISSION_LATENCY.observe(started.elapsed().as_secs_f64());
        }
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
