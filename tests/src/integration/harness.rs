//! Shared fixtures for committee scenarios.

use node_runtime::{Devnet, DevnetBuilder, NodeConfig};
use parking_lot::Mutex;
use shared_bus::{EventFilter, InMemoryEventBus, OracleEvent, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// Upper bound for anything a scenario waits on.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(15);

/// Four oracles, `f = 1`, rounds every few tens of milliseconds.
pub fn fast_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.timings.delta_progress = Duration::from_millis(1_500);
    config.timings.delta_resend = Duration::from_millis(200);
    config.timings.delta_round = Duration::from_millis(50);
    config.timings.delta_grace = Duration::from_millis(20);
    config.timings.round_timeout = Duration::from_millis(400);
    config.transmission.initial_backoff = Duration::from_millis(20);
    config.transmission.max_backoff = Duration::from_millis(100);
    config.verification_threads = 2;
    config
}

/// A devnet wired to an event bus the test can watch.
pub struct Harness {
    pub bus: Arc<InMemoryEventBus>,
    pub devnet: Devnet,
    /// Subscribed before the devnet started so no early event is missed.
    from_start: Mutex<Option<Subscription>>,
}

impl Harness {
    pub fn start() -> Self {
        Self::start_with(|builder| builder)
    }

    /// Start after letting the test customize the builder.
    pub fn start_with(customize: impl FnOnce(DevnetBuilder) -> DevnetBuilder) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let from_start = Mutex::new(Some(bus.subscribe(EventFilter::all())));
        let builder = Devnet::builder(fast_config()).telemetry(bus.clone());
        let devnet = customize(builder).start().expect("devnet starts");
        Self {
            bus,
            devnet,
            from_start,
        }
    }

    /// Every event since start on the first call, a fresh subscription after.
    pub fn events(&self) -> Subscription {
        self.from_start
            .lock()
            .take()
            .unwrap_or_else(|| self.bus.subscribe(EventFilter::all()))
    }

    pub async fn stop(self) {
        self.devnet.shutdown().await;
    }
}

/// Next event matching `predicate`, or `None` after [`SCENARIO_TIMEOUT`].
pub async fn wait_for_event(
    events: &mut Subscription,
    predicate: impl Fn(&OracleEvent) -> bool,
) -> Option<OracleEvent> {
    timeout(SCENARIO_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            if predicate(&event) {
                return Some(event);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Poll `condition` every 20ms until it holds or the scenario times out.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + SCENARIO_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
