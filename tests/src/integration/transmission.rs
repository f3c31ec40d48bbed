//! Contract submissions behind an unreliable RPC.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, wait_for_event, Harness};
    use async_trait::async_trait;
    use node_runtime::InMemoryContract;
    use ocr_07_transmission::{ContractTransmitter, TransmitError};
    use shared_bus::OracleEvent;
    use shared_types::{ReportTimestamp, TxHash};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails transiently for the first `failures` calls, or while `down`.
    struct FlakyRpc {
        contract: Arc<InMemoryContract>,
        failures: u32,
        calls: AtomicU32,
        down: Arc<AtomicBool>,
    }

    impl FlakyRpc {
        fn wrap(
            failures: u32,
            down: Arc<AtomicBool>,
        ) -> impl FnOnce(Arc<InMemoryContract>) -> Arc<dyn ContractTransmitter> {
            move |contract| {
                Arc::new(FlakyRpc {
                    contract,
                    failures,
                    calls: AtomicU32::new(0),
                    down,
                }) as Arc<dyn ContractTransmitter>
            }
        }
    }

    #[async_trait]
    impl ContractTransmitter for FlakyRpc {
        async fn transmit(&self, attested_report: &[u8]) -> Result<TxHash, TransmitError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures || self.down.load(Ordering::SeqCst) {
                return Err(TransmitError::Transient("rpc unavailable".into()));
            }
            self.contract.transmit(attested_report).await
        }

        async fn latest_transmitted(&self) -> Result<Option<ReportTimestamp>, TransmitError> {
            self.contract.latest_transmitted().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transient_failures_are_retried() {
        let down = Arc::new(AtomicBool::new(false));
        let harness = Harness::start_with(|b| b.transmitter(FlakyRpc::wrap(3, down)));
        let mut events = harness.events();

        let failed = wait_for_event(&mut events, |e| {
            matches!(e, OracleEvent::TransmissionFailed { permanent: false, .. })
        })
        .await;
        assert!(failed.is_some());

        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.latest().is_some()).await);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_outage_supersedes_pending_reports() {
        let down = Arc::new(AtomicBool::new(true));
        let harness = Harness::start_with({
            let down = Arc::clone(&down);
            move |b| b.transmitter(FlakyRpc::wrap(0, down))
        });
        let mut events = harness.events();

        let superseded = wait_for_event(&mut events, |e| {
            matches!(e, OracleEvent::TransmissionSuperseded { .. })
        })
        .await;
        match superseded {
            Some(OracleEvent::TransmissionSuperseded { timestamp, by, .. }) => {
                assert!(by.is_newer_than(&timestamp));
            }
            other => panic!("expected TransmissionSuperseded, got {other:?}"),
        }
        assert!(harness.devnet.contract().latest().is_none());

        down.store(false, Ordering::SeqCst);
        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.latest().is_some()).await);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_report_has_one_transmitter() {
        let harness = Harness::start();
        let committee = harness.devnet.committee().unwrap();
        let mut events = harness.events();

        for _ in 0..3 {
            let attempt = wait_for_event(&mut events, |e| {
                matches!(e, OracleEvent::TransmissionAttempted { attempt: 1, .. })
            })
            .await;
            match attempt {
                Some(OracleEvent::TransmissionAttempted {
                    oracle, timestamp, ..
                }) => assert_eq!(oracle, committee.transmitter(&timestamp)),
                other => panic!("expected TransmissionAttempted, got {other:?}"),
            }
        }
        harness.stop().await;
    }
}
