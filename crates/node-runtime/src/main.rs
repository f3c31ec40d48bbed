//! # OCR Node Runtime
//!
//! Runs a local oracle committee: every member in one process, talking over
//! the in-memory transport and submitting to an in-memory contract.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment and validate it
//! 2. Initialize logging, tracing and metrics
//! 3. Start the telemetry forwarder on the event bus
//! 4. Generate keys, install the committee and start every oracle
//! 5. Run until Ctrl-C, then shut down in reverse order

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use node_runtime::{Devnet, NodeConfig};
use ocr_01_numeric_codec::NumericCodec;
use ocr_telemetry::{gather_metrics, init_telemetry, TelemetryForwarder};
use shared_bus::InMemoryEventBus;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How often the contract's latest answer is logged.
const STATUS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let telemetry = init_telemetry(config.telemetry.clone())
        .await
        .context("Failed to initialize telemetry")?;

    match serde_json::to_string(&config) {
        Ok(json) => debug!(config = %json, "effective configuration"),
        Err(e) => warn!(error = %e, "could not serialize configuration"),
    }
    info!("===========================================");
    info!("  OCR Oracle Node v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Committee: n={} f={}",
        config.devnet.committee_size, config.devnet.fault_threshold
    );
    info!("===========================================");

    let bus = Arc::new(InMemoryEventBus::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let forwarder = tokio::spawn(TelemetryForwarder::new(&bus).run(shutdown_rx.clone()));

    let devnet = Devnet::builder(config)
        .telemetry(bus.clone())
        .start()
        .context("Failed to start devnet")?;

    let status = tokio::spawn(report_status(
        Arc::clone(devnet.contract()),
        shutdown_rx,
    ));

    info!(exporting_traces = telemetry.exporting_traces(), "node running, Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    devnet.shutdown().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = forwarder.await {
        warn!(error = %e, "telemetry forwarder panicked");
    }
    if let Err(e) = status.await {
        warn!(error = %e, "status task panicked");
    }

    match gather_metrics() {
        Ok(text) => debug!(metrics = %text, "final metrics"),
        Err(e) => warn!(error = %e, "could not gather metrics"),
    }
    info!("Node stopped");
    Ok(())
}

async fn report_status(
    contract: Arc<node_runtime::InMemoryContract>,
    mut shutdown: watch::Receiver<bool>,
) {
    let codec = NumericCodec::default();
    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => match (contract.latest(), contract.latest_answer(&codec)) {
                (Some(timestamp), Some(answer)) => {
                    info!(%timestamp, %answer, reports = contract.history().len(), "latest answer");
                }
                _ => info!("no report accepted yet"),
            },
        }
    }
}
