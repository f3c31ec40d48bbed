//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging, tracing and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// OpenTelemetry OTLP endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,

    /// Deployment name (devnet, testnet, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ocr-node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            otlp_endpoint: None,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: ocr-node)
    /// - `OCR_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `OCR_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector endpoint (default: unset)
    /// - `OCR_NETWORK`: Deployment name (default: devnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "ocr-node".to_string()),

            log_level: env::var("OCR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("OCR_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            network: env::var("OCR_NETWORK").unwrap_or_else(|_| "devnet".to_string()),
        }
    }

    /// Whether spans are exported over OTLP.
    pub fn exports_traces(&self) -> bool {
        self.otlp_endpoint.is_some()
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "ocr-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.exports_traces());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn test_exports_traces_when_endpoint_set() {
        let config = TelemetryConfig {
            otlp_endpoint: Some("http://localhost:4317".to_string()),
            ..Default::default()
        };
        assert!(config.exports_traces());
    }
}
