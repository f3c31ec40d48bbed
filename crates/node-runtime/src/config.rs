//! # Node Configuration
//!
//! Unified configuration for the node and its local devnet.
//!
//! Defaults are overridden by `OCR_*` environment variables, then the whole
//! configuration is validated before anything starts.

use ocr_03_committee_registry::{ProtocolTimings, MAX_ORACLES};
use ocr_07_transmission::TransmissionConfig;
use ocr_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    /// Committee size and fault threshold do not fit together.
    #[error("invalid committee: {0}")]
    InvalidCommittee(String),

    /// Timing or retry parameters violate their constraints.
    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    #[error("invalid data source: {0}")]
    InvalidDataSource(String),
}

/// Random-walk data source parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Starting value of every oracle's walk.
    pub initial_value: i64,
    /// Largest change between two observations.
    pub max_step: i64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            initial_value: 200_000,
            max_step: 25,
        }
    }
}

/// Local devnet parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevnetConfig {
    /// Committee size `n`.
    pub committee_size: usize,
    /// Fault threshold `f`.
    pub fault_threshold: u8,
    pub chain_id: u64,
    pub contract_address: Address,
    /// Per-peer inbound mailbox size.
    pub mailbox_capacity: usize,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            committee_size: 4,
            fault_threshold: 1,
            chain_id: 1337,
            contract_address: [0x0c; 20],
            mailbox_capacity: shared_bus::DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub devnet: DevnetConfig,
    pub timings: ProtocolTimings,
    pub transmission: TransmissionConfig,
    pub data_source: DataSourceConfig,
    pub telemetry: TelemetryConfig,
    /// Worker threads for batch signature verification (0 = one per core).
    pub verification_threads: usize,
}

impl NodeConfig {
    /// Load defaults, then apply `OCR_*` overrides.
    ///
    /// # Environment Variables
    ///
    /// - `OCR_COMMITTEE_SIZE`, `OCR_FAULT_THRESHOLD`, `OCR_CHAIN_ID`
    /// - `OCR_CONTRACT_ADDRESS` (20 bytes hex, optional `0x`)
    /// - `OCR_MAILBOX_CAPACITY`
    /// - `OCR_DELTA_PROGRESS_MS`, `OCR_DELTA_RESEND_MS`, `OCR_DELTA_ROUND_MS`,
    ///   `OCR_DELTA_GRACE_MS`, `OCR_ROUND_TIMEOUT_MS`, `OCR_MAX_ROUNDS`
    /// - `OCR_LEADER_OFFSET`, `OCR_TRANSMITTER_OFFSET`
    /// - `OCR_TX_INITIAL_BACKOFF_MS`, `OCR_TX_MAX_BACKOFF_MS`,
    ///   `OCR_TX_MAX_ATTEMPTS`
    /// - `OCR_INITIAL_VALUE`, `OCR_MAX_STEP`
    /// - `OCR_VERIFICATION_THREADS`
    /// - telemetry variables, see [`TelemetryConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };

        let devnet = &mut config.devnet;
        override_parsed(&lookup, "OCR_COMMITTEE_SIZE", &mut devnet.committee_size)?;
        override_parsed(&lookup, "OCR_FAULT_THRESHOLD", &mut devnet.fault_threshold)?;
        override_parsed(&lookup, "OCR_CHAIN_ID", &mut devnet.chain_id)?;
        override_parsed(&lookup, "OCR_MAILBOX_CAPACITY", &mut devnet.mailbox_capacity)?;
        if let Some(raw) = lookup("OCR_CONTRACT_ADDRESS") {
            devnet.contract_address = parse_address(&raw)?;
        }

        let timings = &mut config.timings;
        override_millis(&lookup, "OCR_DELTA_PROGRESS_MS", &mut timings.delta_progress)?;
        override_millis(&lookup, "OCR_DELTA_RESEND_MS", &mut timings.delta_resend)?;
        override_millis(&lookup, "OCR_DELTA_ROUND_MS", &mut timings.delta_round)?;
        override_millis(&lookup, "OCR_DELTA_GRACE_MS", &mut timings.delta_grace)?;
        override_millis(&lookup, "OCR_ROUND_TIMEOUT_MS", &mut timings.round_timeout)?;
        override_parsed(&lookup, "OCR_MAX_ROUNDS", &mut timings.max_rounds_per_epoch)?;
        override_parsed(&lookup, "OCR_LEADER_OFFSET", &mut timings.leader_offset)?;
        override_parsed(&lookup, "OCR_TRANSMITTER_OFFSET", &mut timings.transmitter_offset)?;

        let transmission = &mut config.transmission;
        override_millis(&lookup, "OCR_TX_INITIAL_BACKOFF_MS", &mut transmission.initial_backoff)?;
        override_millis(&lookup, "OCR_TX_MAX_BACKOFF_MS", &mut transmission.max_backoff)?;
        if let Some(raw) = lookup("OCR_TX_MAX_ATTEMPTS") {
            transmission.max_attempts = Some(parse("OCR_TX_MAX_ATTEMPTS", &raw)?);
        }

        override_parsed(&lookup, "OCR_INITIAL_VALUE", &mut config.data_source.initial_value)?;
        override_parsed(&lookup, "OCR_MAX_STEP", &mut config.data_source.max_step)?;
        override_parsed(&lookup, "OCR_VERIFICATION_THREADS", &mut config.verification_threads)?;

        Ok(config)
    }

    /// Check everything that can be checked before the committee exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.devnet.committee_size;
        let f = usize::from(self.devnet.fault_threshold);
        if n == 0 || n > MAX_ORACLES {
            return Err(ConfigError::InvalidCommittee(format!(
                "committee size {n} outside 1..={MAX_ORACLES}"
            )));
        }
        if 3 * f >= n {
            return Err(ConfigError::InvalidCommittee(format!(
                "fault threshold {f} needs more than {} members, have {n}",
                3 * f
            )));
        }
        if self.devnet.mailbox_capacity == 0 {
            return Err(ConfigError::InvalidCommittee("mailbox capacity must be positive".into()));
        }

        self.timings
            .validate()
            .map_err(|e| ConfigError::InvalidTiming(e.to_string()))?;
        self.transmission
            .validate()
            .map_err(|e| ConfigError::InvalidTiming(e.to_string()))?;

        if self.data_source.max_step < 0 {
            return Err(ConfigError::InvalidDataSource("max step must not be negative".into()));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var,
        reason: e.to_string(),
    })
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(var) {
        *target = parse(var, &raw)?;
    }
    Ok(())
}

fn override_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut Duration,
) -> Result<(), ConfigError> {
    if let Some(raw) = lookup(var) {
        *target = Duration::from_millis(parse(var, &raw)?);
    }
    Ok(())
}

fn parse_address(raw: &str) -> Result<Address, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnv {
        var: "OCR_CONTRACT_ADDRESS",
        reason,
    };
    let trimmed = raw.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| invalid(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("expected 20 bytes, got {}", b.len())))
}
