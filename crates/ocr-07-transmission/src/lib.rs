//! # Transmission Subsystem (OCR-07)
//!
//! Decides which committee member submits an attested report on-chain and
//! drives that submission.
//!
//! ## Rules
//!
//! - The transmitter for a report is
//!   `transmitter_rotation.select(epoch * 256 + round)`, so every honest
//!   node agrees on it without messages.
//! - Transient failures are retried with capped exponential backoff.
//! - Permanent failures end the attempt for that report.
//! - A newer report cancels the pending transmission of an older one, and
//!   a report the contract already holds (or has surpassed) is never sent.
//!
//! Failures are reported to telemetry and never block the pacemaker.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::TransmissionConfig;
pub use domain::errors::{TransmitError, TransmitResult};
pub use domain::selection::{decide, select_transmitter, TransmissionDecision};
pub use ports::outbound::ContractTransmitter;
pub use service::{TransmissionDependencies, TransmissionOutcome, TransmissionScheduler};
