//! Committee configuration changes while the protocol runs.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, wait_for_event, Harness};
    use shared_bus::OracleEvent;
    use shared_types::ConfigDigest;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reports_continue_under_new_config() {
        let harness = Harness::start();
        let contract = harness.devnet.contract().clone();
        let old = harness.devnet.committee().unwrap().digest;
        assert!(eventually(|| contract.latest().is_some()).await);

        let new = harness.devnet.reconfigure().unwrap();
        assert_ne!(old, new);
        assert!(
            eventually(|| contract
                .latest()
                .is_some_and(|t| t.config_digest == new))
            .await
        );

        // Nothing from the old configuration is accepted after the switch
        let switched = contract
            .history()
            .iter()
            .position(|t| t.timestamp().config_digest == new)
            .unwrap();
        assert!(contract.history()[switched..]
            .iter()
            .all(|t| t.timestamp().config_digest == new));
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unknown_digest_halts_only_that_instance() {
        let harness = Harness::start();
        let mut events = harness.events();
        let known = harness.devnet.committee().unwrap().digest;
        let unknown = ConfigDigest([0xAB; 32]);

        harness.devnet.announce(unknown);
        let halted = wait_for_event(&mut events, |e| {
            matches!(
                e,
                OracleEvent::ProtocolHalted { config_digest, .. } if *config_digest == unknown
            )
        })
        .await;
        assert!(halted.is_some());
        for i in 0..harness.devnet.size() {
            let running = harness.devnet.running(i).unwrap();
            assert!(eventually(|| running.borrow().is_none()).await);
        }

        // Supervisors survive and pick the valid configuration back up
        harness.devnet.announce(known);
        for i in 0..harness.devnet.size() {
            let running = harness.devnet.running(i).unwrap();
            assert!(eventually(|| *running.borrow() == Some(known)).await);
        }
        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.latest().is_some()).await);
        harness.stop().await;
    }
}
