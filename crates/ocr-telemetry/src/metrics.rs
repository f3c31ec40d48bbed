//! Prometheus metrics for the oracle node.
//!
//! Naming follows `ocr_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PACEMAKER METRICS
    // =========================================================================

    /// Epochs entered, across all local oracles
    pub static ref EPOCHS_STARTED: Counter = Counter::new(
        "ocr_pacemaker_epochs_started_total",
        "Total number of epochs entered"
    ).expect("metric creation failed");

    /// Current epoch per oracle
    pub static ref CURRENT_EPOCH: GaugeVec = GaugeVec::new(
        Opts::new("ocr_pacemaker_epoch", "Current epoch"),
        &["oracle"]
    ).expect("metric creation failed");

    /// Rounds started by the leader or joined by a follower
    pub static ref ROUNDS_STARTED: Counter = Counter::new(
        "ocr_pacemaker_rounds_started_total",
        "Total number of rounds started"
    ).expect("metric creation failed");

    /// Rounds that ended without a report, by reason
    pub static ref ROUNDS_ABANDONED: CounterVec = CounterVec::new(
        Opts::new("ocr_pacemaker_rounds_abandoned_total", "Rounds abandoned by reason"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // REPORT METRICS
    // =========================================================================

    /// Attested reports delivered
    pub static ref REPORTS_ATTESTED: Counter = Counter::new(
        "ocr_report_attested_total",
        "Total number of attested reports delivered"
    ).expect("metric creation failed");

    /// Observations discarded by the leader, by reason
    pub static ref OBSERVATIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("ocr_report_observations_rejected_total", "Observations rejected by reason"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSMISSION METRICS
    // =========================================================================

    /// Transmission attempts by outcome
    pub static ref TRANSMISSIONS: CounterVec = CounterVec::new(
        Opts::new("ocr_transmission_outcomes_total", "Transmission attempts by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Time from attempt to contract response
    pub static ref TRANSMISSION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ocr_transmission_attempt_duration_seconds",
            "Time from transmission attempt to contract response"
        ).buckets(prometheus::exponential_buckets(0.001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE METRICS
    // =========================================================================

    /// Protocol instances stopped on a fatal condition
    pub static ref PROTOCOL_HALTS: Counter = Counter::new(
        "ocr_lifecycle_halts_total",
        "Protocol instances halted"
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    /// Registry the metrics live in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Pacemaker
        Box::new(EPOCHS_STARTED.clone()),
        Box::new(CURRENT_EPOCH.clone()),
        Box::new(ROUNDS_STARTED.clone()),
        Box::new(ROUNDS_ABANDONED.clone()),
        // Report
        Box::new(REPORTS_ATTESTED.clone()),
        Box::new(OBSERVATIONS_REJECTED.clone()),
        // Transmission
        Box::new(TRANSMISSIONS.clone()),
        Box::new(TRANSMISSION_LATENCY.clone()),
        // Lifecycle
        Box::new(PROTOCOL_HALTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Render all metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_gather_includes_registered_metrics() {
        let handle = register_metrics().unwrap();
        ROUNDS_STARTED.inc();
        ROUNDS_ABANDONED
            .with_label_values(&["quorum_not_reached"])
            .inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("ocr_pacemaker_rounds_started_total"));
        assert!(text.contains("reason=\"quorum_not_reached\""));
        assert!(!handle.registry().gather().is_empty());
    }
}
