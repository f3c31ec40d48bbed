use super::*;
use async_trait::async_trait;
use ocr_01_numeric_codec::{BigInt, NumericCodec};
use ocr_03_committee_registry::{OracleIdentity, ProtocolTimings};
use ocr_04_report_aggregation::Report;
use parking_lot::Mutex;
use shared_types::{keccak256, Observation, Round};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// MOCK IMPLEMENTATIONS
// =============================================================================

#[derive(Default)]
struct ContractState {
    latest: Option<ReportTimestamp>,
    attempts: Vec<ReportTimestamp>,
    failures: VecDeque<TransmitError>,
    failing_rounds: HashMap<Round, TransmitError>,
}

/// Contract double that records every submission.
#[derive(Default)]
struct MockContract {
    state: Mutex<ContractState>,
}

impl MockContract {
    fn attempts(&self) -> Vec<ReportTimestamp> {
        self.state.lock().attempts.clone()
    }

    fn attempts_for(&self, round: Round) -> usize {
        self.attempts().iter().filter(|ts| ts.round == round).count()
    }
}

#[async_trait]
impl ContractTransmitter for MockContract {
    async fn transmit(&self, attested_report: &[u8]) -> Result<TxHash, TransmitError> {
        let report = AttestedReport::from_bytes(attested_report)
            .map_err(|e| TransmitError::Permanent(e.to_string()))?;
        let timestamp = *report.timestamp();

        let mut state = self.state.lock();
        state.attempts.push(timestamp);
        if let Some(error) = state.failing_rounds.get(&timestamp.round) {
            return Err(error.clone());
        }
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        if state.latest.map_or(true, |l| timestamp.is_newer_than(&l)) {
            state.latest = Some(timestamp);
        }
        Ok(TxHash(keccak256(attested_report)))
    }

    async fn latest_transmitted(&self) -> Result<Option<ReportTimestamp>, TransmitError> {
        Ok(self.state.lock().latest)
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<OracleEvent>>,
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, event: OracleEvent) {
        self.events.lock().push(event);
    }
}

impl RecordingSink {
    fn count(&self, predicate: impl Fn(&OracleEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

// =============================================================================
// HARNESS
// =============================================================================

fn committee(n: u8, f: u8) -> Arc<CommitteeConfig> {
    let oracles = (0..n)
        .map(|i| OracleIdentity {
            offchain_public_key: [i + 1; 32],
            onchain_signer: [i + 1; 20],
            transmitter: [i + 100; 20],
            peer_id: format!("peer-{i}"),
        })
        .collect();
    Arc::new(CommitteeConfig::new(5, [1; 20], 1, oracles, f, ProtocolTimings::default()).unwrap())
}

fn attested(committee: &CommitteeConfig, epoch: u32, round: Round) -> AttestedReport {
    let value = Observation(NumericCodec::default().encode(&BigInt::from(42)).unwrap());
    AttestedReport {
        report: Report {
            timestamp: ReportTimestamp::new(committee.digest, epoch, round),
            observers: vec![OracleId(0)],
            observations: vec![value.clone()],
            median: value,
        },
        signatures: Vec::new(),
    }
}

fn fast_config() -> TransmissionConfig {
    TransmissionConfig {
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
        backoff_multiplier: 2.0,
        max_attempts: None,
    }
}

struct Harness {
    committee: Arc<CommitteeConfig>,
    contract: Arc<MockContract>,
    sink: Arc<RecordingSink>,
    reports: watch::Sender<Option<AttestedReport>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Harness {
    fn start(
        me: u8,
        committee: Arc<CommitteeConfig>,
        contract: MockContract,
        config: TransmissionConfig,
    ) -> Self {
        let contract = Arc::new(contract);
        let sink = Arc::new(RecordingSink::default());
        let scheduler = TransmissionScheduler::new(TransmissionDependencies {
            oracle_id: OracleId(me),
            committee: Arc::clone(&committee),
            contract: contract.clone(),
            telemetry: sink.clone(),
            config,
        })
        .unwrap();

        let (reports, reports_rx) = watch::channel(None);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(reports_rx, shutdown_rx));
        Self {
            committee,
            contract,
            sink,
            reports,
            shutdown,
            handle,
        }
    }

    fn deliver(&self, epoch: u32, round: Round) -> ReportTimestamp {
        let report = attested(&self.committee, epoch, round);
        let ts = *report.timestamp();
        self.reports.send_replace(Some(report));
        ts
    }

    async fn wait_until(&self, within: Duration, check: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        check(self)
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap();
    }
}

fn succeeded(ts: ReportTimestamp) -> impl Fn(&OracleEvent) -> bool {
    move |e| matches!(e, OracleEvent::TransmissionSucceeded { timestamp, .. } if *timestamp == ts)
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn test_selected_transmitter_submits() {
    // sequence(1, 1) = 257, 257 mod 4 = 1
    let h = Harness::start(1, committee(4, 1), MockContract::default(), fast_config());
    let ts = h.deliver(1, 1);

    assert!(h.wait_until(Duration::from_secs(2), |h| h.sink.count(succeeded(ts)) == 1).await);
    assert_eq!(h.contract.attempts(), vec![ts]);
    assert_eq!(
        h.sink.count(|e| matches!(e, OracleEvent::TransmissionAttempted { attempt: 1, .. })),
        1
    );
    h.stop().await;
}

#[tokio::test]
async fn test_other_members_stay_quiet() {
    let h = Harness::start(0, committee(4, 1), MockContract::default(), fast_config());
    h.deliver(1, 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.contract.attempts().is_empty());
    assert_eq!(h.sink.count(|_| true), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_transient_errors_retry_with_backoff() {
    let contract = MockContract::default();
    contract.state.lock().failures = VecDeque::from(vec![
        TransmitError::Transient("rpc timeout".into()),
        TransmitError::Transient("rpc timeout".into()),
    ]);
    let h = Harness::start(1, committee(4, 1), contract, fast_config());
    let ts = h.deliver(1, 1);

    assert!(h.wait_until(Duration::from_secs(2), |h| h.sink.count(succeeded(ts)) == 1).await);
    assert_eq!(h.contract.attempts().len(), 3);
    assert_eq!(
        h.sink.count(|e| matches!(e, OracleEvent::TransmissionFailed { permanent: false, .. })),
        2
    );
    assert_eq!(
        h.sink.count(|e| matches!(e, OracleEvent::TransmissionAttempted { attempt: 3, .. })),
        1
    );
    h.stop().await;
}

#[tokio::test]
async fn test_permanent_error_is_not_retried() {
    let contract = MockContract::default();
    contract
        .state
        .lock()
        .failures
        .push_back(TransmitError::Permanent("config digest mismatch".into()));
    let h = Harness::start(1, committee(4, 1), contract, fast_config());
    h.deliver(1, 1);

    assert!(
        h.wait_until(Duration::from_secs(2), |h| {
            h.sink
                .count(|e| matches!(e, OracleEvent::TransmissionFailed { permanent: true, .. }))
                == 1
        })
        .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.contract.attempts().len(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_newer_report_supersedes_pending_retry() {
    let contract = MockContract::default();
    contract
        .state
        .lock()
        .failing_rounds
        .insert(5, TransmitError::Transient("node unreachable".into()));
    // Single-member committee: this node transmits every round
    let h = Harness::start(0, committee(1, 0), contract, fast_config());

    let round5 = h.deliver(1, 5);
    assert!(h.wait_until(Duration::from_secs(2), |h| h.contract.attempts_for(5) >= 2).await);

    let round6 = h.deliver(1, 6);
    assert!(h.wait_until(Duration::from_secs(2), |h| h.sink.count(succeeded(round6)) == 1).await);
    assert_eq!(
        h.sink.count(|e| matches!(
            e,
            OracleEvent::TransmissionSuperseded { timestamp, by, .. }
                if *timestamp == round5 && *by == round6
        )),
        1
    );

    let retries = h.contract.attempts_for(5);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.contract.attempts_for(5), retries);
    assert_eq!(h.contract.attempts_for(6), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_report_already_on_chain_is_skipped() {
    let c = committee(1, 0);
    let contract = MockContract::default();
    let on_chain = ReportTimestamp::new(c.digest, 1, 7);
    contract.state.lock().latest = Some(on_chain);
    let h = Harness::start(0, c, contract, fast_config());

    let ts = h.deliver(1, 5);
    assert!(
        h.wait_until(Duration::from_secs(2), |h| {
            h.sink.count(|e| matches!(
                e,
                OracleEvent::TransmissionSuperseded { timestamp, by, .. }
                    if *timestamp == ts && *by == on_chain
            )) == 1
        })
        .await
    );
    assert!(h.contract.attempts().is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_max_attempts_gives_up() {
    let contract = MockContract::default();
    contract
        .state
        .lock()
        .failing_rounds
        .insert(1, TransmitError::Transient("rpc timeout".into()));
    let config = TransmissionConfig {
        max_attempts: Some(2),
        ..fast_config()
    };
    let h = Harness::start(0, committee(1, 0), contract, config);
    h.deliver(1, 1);

    assert!(h.wait_until(Duration::from_secs(2), |h| h.contract.attempts_for(1) == 2).await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.contract.attempts_for(1), 2);
    h.stop().await;
}

#[tokio::test]
async fn test_older_report_never_replaces_newer() {
    let c = committee(1, 0);
    let contract: Arc<MockContract> = Arc::new(MockContract::default());
    contract
        .state
        .lock()
        .failing_rounds
        .insert(6, TransmitError::Transient("slow".into()));
    let mut scheduler = TransmissionScheduler::new(TransmissionDependencies {
        oracle_id: OracleId(0),
        committee: Arc::clone(&c),
        contract,
        telemetry: Arc::new(RecordingSink::default()),
        config: fast_config(),
    })
    .unwrap();

    scheduler.on_report(attested(&c, 2, 6));
    scheduler.on_report(attested(&c, 2, 5));
    scheduler.on_report(attested(&c, 1, 9));
    assert_eq!(scheduler.pending().map(|ts| (ts.epoch, ts.round)), Some((2, 6)));
}

#[test]
fn test_invalid_config_rejected() {
    let result = TransmissionScheduler::new(TransmissionDependencies {
        oracle_id: OracleId(0),
        committee: committee(1, 0),
        contract: Arc::new(MockContract::default()),
        telemetry: Arc::new(RecordingSink::default()),
        config: TransmissionConfig {
            max_attempts: Some(0),
            ..Default::default()
        },
    });
    assert!(matches!(result, Err(TransmitError::InvalidConfig(_))));
}
