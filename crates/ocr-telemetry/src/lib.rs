//! # OCR Telemetry
//!
//! Observability for the oracle node.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON output
//! - **Traces**: optional OpenTelemetry OTLP export
//! - **Metrics**: Prometheus counters, gauges and histograms
//! - **Forwarder**: turns [`shared_bus::OracleEvent`]s into metrics and logs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_telemetry::{init_telemetry, TelemetryConfig, TelemetryForwarder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await?;
//!     let bus = Arc::new(InMemoryEventBus::new());
//!     tokio::spawn(TelemetryForwarder::new(&bus).run(shutdown_rx));
//!     // hand `bus` to the protocol as its TelemetrySink
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP collector; span export is off when unset |
//! | `OTEL_SERVICE_NAME` | `ocr-node` | Service name in traces |
//! | `OCR_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `OCR_JSON_LOGS` | `false` | JSON log lines |
//! | `OCR_NETWORK` | `devnet` | Deployment name attached to spans |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod forwarder;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use forwarder::TelemetryForwarder;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, CURRENT_EPOCH, EPOCHS_STARTED,
    OBSERVATIONS_REJECTED, PROTOCOL_HALTS, REGISTRY, REPORTS_ATTESTED, ROUNDS_ABANDONED,
    ROUNDS_STARTED, TRANSMISSIONS, TRANSMISSION_LATENCY,
};
pub use tracing_setup::{env_filter, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, tracing and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first (synchronous, cannot conflict with a prior subscriber)
    let metrics = register_metrics()?;
    let tracing = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        tracing,
        metrics,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shut down.
pub struct TelemetryGuard {
    tracing: TracingGuard,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    pub fn exporting_traces(&self) -> bool {
        self.tracing.exporting()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad filter".into());
        assert_eq!(err.to_string(), "Invalid configuration: bad filter");
    }
}
