//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use ocr_01_numeric_codec::BigInt;
use shared_types::ReportTimestamp;
use thiserror::Error;

/// Failure to obtain a local measurement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("data source returned invalid data: {0}")]
    InvalidData(String),
}

/// Source of this node's observation for a round.
///
/// Called on a cancellable task; implementations may take as long as they
/// need, the round driver drops the call when the round is abandoned.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Measure the value to report for `timestamp`.
    async fn observe(&self, timestamp: &ReportTimestamp) -> Result<BigInt, DataSourceError>;
}
