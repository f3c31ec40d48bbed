//! # Transmission Config
//!
//! Retry policy for on-chain submission. Delay before retry `k` (0-based) is
//! `initial_backoff * backoff_multiplier^k`, capped at `max_backoff`.

use super::errors::{TransmitError, TransmitResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransmissionConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub initial_backoff: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_backoff: Duration,

    pub backoff_multiplier: f64,

    /// Attempts per report before giving up. `None` retries until the
    /// report is superseded or fails permanently.
    pub max_attempts: Option<u32>,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl TransmissionConfig {
    pub fn validate(&self) -> TransmitResult<()> {
        if self.initial_backoff.is_zero() {
            return Err(TransmitError::InvalidConfig(
                "initial_backoff must be non-zero".into(),
            ));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(TransmitError::InvalidConfig(
                "max_backoff must not be below initial_backoff".into(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(TransmitError::InvalidConfig(format!(
                "backoff_multiplier must be >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_attempts == Some(0) {
            return Err(TransmitError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        if !millis.is_finite() || millis >= self.max_backoff.as_millis() as f64 {
            return self.max_backoff;
        }
        Duration::from_millis(millis as u64)
    }

    /// Whether `attempts` made so far exhaust the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}
