//! Feed outages and an unreachable leader.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, wait_for_event, Harness};
    use node_runtime::RandomWalkSource;
    use shared_bus::OracleEvent;
    use shared_types::AbandonReason;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_outage_abandons_rounds_until_recovery() {
        let feeds: Vec<_> = (0..4)
            .map(|_| {
                let feed = Arc::new(RandomWalkSource::new(1_000, 1));
                feed.set_available(false);
                feed
            })
            .collect();
        let harness = Harness::start_with(|mut builder| {
            for (i, feed) in feeds.iter().enumerate() {
                builder = builder.data_source(i, feed.clone());
            }
            builder
        });
        let mut events = harness.events();

        let abandoned = wait_for_event(&mut events, |e| {
            matches!(
                e,
                OracleEvent::RoundAbandoned {
                    reason: AbandonReason::InsufficientObservations,
                    ..
                }
            )
        })
        .await;
        assert!(abandoned.is_some());
        assert!(harness.devnet.contract().latest().is_none());

        for feed in &feeds {
            feed.set_available(true);
        }
        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.latest().is_some()).await);
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_feed_outage_is_tolerated() {
        let down = Arc::new(RandomWalkSource::new(1_000, 1));
        down.set_available(false);
        let harness = Harness::start_with(|builder| builder.data_source(2, down.clone()));

        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.history().len() >= 2).await);
        for transmission in contract.history() {
            assert!(!transmission
                .report
                .observers
                .contains(&shared_types::OracleId(2)));
        }
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_f_plus_one_feeds_still_report() {
        let feeds: Vec<_> = (0..2)
            .map(|_| {
                let feed = Arc::new(RandomWalkSource::new(1_000, 1));
                feed.set_available(false);
                feed
            })
            .collect();
        let harness = Harness::start_with(|mut builder| {
            for (i, feed) in feeds.iter().enumerate() {
                builder = builder.data_source(i, feed.clone());
            }
            builder
        });
        let committee = harness.devnet.committee().unwrap();

        // Only oracles 2 and 3 observe: exactly f+1 of 4
        let contract = harness.devnet.contract().clone();
        assert!(eventually(|| contract.latest().is_some()).await);
        for transmission in contract.history() {
            let observers = &transmission.report.observers;
            assert_eq!(observers.len(), committee.min_observations());
            assert!(observers
                .iter()
                .all(|o| *o == shared_types::OracleId(2) || *o == shared_types::OracleId(3)));
        }
        harness.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unreachable_leader_is_replaced() {
        let harness = Harness::start();
        let mut events = harness.events();
        let committee = harness.devnet.committee().unwrap();
        let first_leader = committee.leader(1);

        let mut running = harness
            .devnet
            .running(first_leader.index())
            .unwrap();
        running
            .wait_for(|d| *d == Some(committee.digest))
            .await
            .unwrap();
        harness.devnet.network().set_online(first_leader, false);

        // The others time out on progress and agree on a later epoch
        let next = wait_for_event(&mut events, |e| match e {
            OracleEvent::EpochStarted { oracle, leader, .. } => {
                *oracle != first_leader && *leader != first_leader
            }
            _ => false,
        })
        .await;
        assert!(matches!(next, Some(OracleEvent::EpochStarted { epoch, .. }) if epoch > 1));

        let contract = harness.devnet.contract().clone();
        assert!(
            eventually(|| contract
                .latest()
                .is_some_and(|t| committee.leader(t.epoch) != first_leader))
            .await
        );
        harness.stop().await;
    }
}
