//! All four oracles online with healthy feeds.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, wait_for_event, Harness};
    use ocr_01_numeric_codec::{BigInt, NumericCodec};
    use shared_bus::OracleEvent;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_committee_reports_reach_the_contract() {
        let harness = Harness::start();
        let contract = harness.devnet.contract().clone();

        assert!(eventually(|| contract.history().len() >= 3).await);

        let committee = harness.devnet.committee().unwrap();
        let codec = NumericCodec::default();
        for transmission in contract.history() {
            let report = &transmission.report;
            assert_eq!(report.timestamp.config_digest, committee.digest);
            assert!(report.observers.len() >= committee.min_observations());
            assert!(transmission.signers >= committee.quorum());

            // Lower median of the submitted values
            let mut values: Vec<_> = report
                .observations
                .iter()
                .map(|o| codec.decode(o.as_bytes()).unwrap())
                .collect();
            values.sort();
            assert_eq!(
                report.median_value(&codec).unwrap(),
                values[(values.len() - 1) / 2]
            );
        }

        // Accepted reports are strictly increasing
        let history = contract.history();
        for pair in history.windows(2) {
            assert!(pair[1].timestamp().is_newer_than(pair[0].timestamp()));
        }
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_epoch_and_transmission_events() {
        let harness = Harness::start();
        let mut events = harness.events();
        let committee = harness.devnet.committee().unwrap();

        let started = wait_for_event(&mut events, |e| {
            matches!(e, OracleEvent::EpochStarted { epoch: 1, .. })
        })
        .await;
        match started {
            Some(OracleEvent::EpochStarted { leader, .. }) => {
                assert_eq!(leader, committee.leader(1))
            }
            other => panic!("expected EpochStarted, got {other:?}"),
        }

        let succeeded = wait_for_event(&mut events, |e| {
            matches!(e, OracleEvent::TransmissionSucceeded { .. })
        })
        .await;
        match succeeded {
            Some(OracleEvent::TransmissionSucceeded { oracle, timestamp, .. }) => {
                assert_eq!(oracle, committee.transmitter(&timestamp));
            }
            other => panic!("expected TransmissionSucceeded, got {other:?}"),
        }
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_latest_answer_tracks_feeds() {
        let harness = Harness::start();
        let contract = harness.devnet.contract().clone();
        let codec = NumericCodec::default();

        assert!(eventually(|| contract.latest_answer(&codec).is_some()).await);
        let answer = contract.latest_answer(&codec).unwrap();

        // Every walk starts at the same value and moves at most 25 per step
        let walks: Vec<i64> = (0..harness.devnet.size())
            .filter_map(|i| harness.devnet.walk(i).map(|w| w.current()))
            .collect();
        let low = walks.iter().min().copied().unwrap() - 10_000;
        let high = walks.iter().max().copied().unwrap() + 10_000;
        assert!(answer >= BigInt::from(low) && answer <= BigInt::from(high));
        harness.stop().await;
    }
}
