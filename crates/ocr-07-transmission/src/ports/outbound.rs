//! Driven ports (Outbound dependencies)

use crate::domain::errors::TransmitError;
use async_trait::async_trait;
use shared_types::{ReportTimestamp, TxHash};

/// The on-chain aggregator contract, as seen by a transmitter.
#[async_trait]
pub trait ContractTransmitter: Send + Sync {
    /// `SubmitTransaction(attestedReportBytes) -> TxHash | error`
    async fn transmit(&self, attested_report: &[u8]) -> Result<TxHash, TransmitError>;

    /// Newest report the contract has accepted, if any.
    async fn latest_transmitted(&self) -> Result<Option<ReportTimestamp>, TransmitError>;
}
