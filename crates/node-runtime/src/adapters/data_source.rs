//! Random-walk data source for the local devnet.

use async_trait::async_trait;
use ocr_01_numeric_codec::BigInt;
use ocr_04_report_aggregation::{DataSource, DataSourceError};
use parking_lot::Mutex;
use rand::Rng;
use shared_types::ReportTimestamp;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Each observation moves the value by at most `max_step` in either
/// direction.
pub struct RandomWalkSource {
    value: Mutex<i64>,
    max_step: i64,
    available: AtomicBool,
}

impl RandomWalkSource {
    pub fn new(initial_value: i64, max_step: i64) -> Self {
        Self {
            value: Mutex::new(initial_value),
            max_step: max_step.max(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: observations fail while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn current(&self) -> i64 {
        *self.value.lock()
    }
}

#[async_trait]
impl DataSource for RandomWalkSource {
    async fn observe(&self, timestamp: &ReportTimestamp) -> Result<BigInt, DataSourceError> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(DataSourceError::Unavailable("feed offline".into()));
        }

        let step = rand::thread_rng().gen_range(-self.max_step..=self.max_step);
        let mut value = self.value.lock();
        *value = value.saturating_add(step);
        trace!(%timestamp, value = *value, "observed");
        Ok(BigInt::from(*value))
    }
}
