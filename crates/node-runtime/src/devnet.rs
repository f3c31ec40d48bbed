//! # Local Devnet
//!
//! A whole committee in one process: `n` generated key pairs, the
//! in-memory transport, one supervisor per oracle, and one shared
//! in-memory contract.

use crate::adapters::{InMemoryContract, RandomWalkSource};
use crate::config::{ConfigError, NodeConfig};
use crate::instance::{InstanceDependencies, ProtocolInstance};
use crate::supervisor::{InstanceFactory, InstanceSupervisor, SupervisorError};
use ocr_02_observation_signing::{
    ObservationSigner, OffchainKeypair, OnchainKeypair, ReportSigner, SigningError,
    VerificationPool,
};
use ocr_03_committee_registry::{CommitteeConfig, ConfigRegistry, OracleIdentity, RegistryError};
use ocr_04_report_aggregation::{DataSource, MedianPlugin};
use ocr_07_transmission::{ContractTransmitter, TransmissionConfig};
use shared_bus::{InMemoryNetwork, NoopSink, TelemetrySink};
use shared_types::{Address, ConfigDigest, OracleId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Errors bringing the devnet up or reconfiguring it.
#[derive(Debug, Error)]
pub enum DevnetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

// =============================================================================
// PER-ORACLE FACTORY
// =============================================================================

/// Builds instances for one devnet oracle.
struct DevnetOracle {
    offchain: Arc<OffchainKeypair>,
    onchain: Arc<OnchainKeypair>,
    network: InMemoryNetwork,
    telemetry: Arc<dyn TelemetrySink>,
    data_source: Arc<dyn DataSource>,
    contract: Arc<dyn ContractTransmitter>,
    transmission: TransmissionConfig,
    plugin: MedianPlugin,
    pool: Arc<VerificationPool>,
}

impl InstanceFactory for DevnetOracle {
    fn spawn(&self, committee: Arc<CommitteeConfig>) -> Result<ProtocolInstance, SupervisorError> {
        let key = self.offchain.public_key();
        let oracle_id = committee
            .oracles
            .iter()
            .position(|o| o.offchain_public_key == key)
            .map(|i| OracleId(i as u8))
            .ok_or(SupervisorError::NotAMember(committee.digest))?;

        let (endpoint, inbound) = self.network.join(oracle_id);
        Ok(ProtocolInstance::spawn(InstanceDependencies {
            oracle_id,
            committee,
            transport: Arc::new(endpoint),
            inbound,
            telemetry: Arc::clone(&self.telemetry),
            observation_signer: self.offchain.clone(),
            report_signer: self.onchain.clone(),
            data_source: Arc::clone(&self.data_source),
            contract: Arc::clone(&self.contract),
            transmission: self.transmission.clone(),
            plugin: self.plugin.clone(),
            pool: Arc::clone(&self.pool),
        })?)
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Configures a [`Devnet`] before it starts.
pub struct DevnetBuilder {
    config: NodeConfig,
    telemetry: Arc<dyn TelemetrySink>,
    data_sources: HashMap<usize, Arc<dyn DataSource>>,
    transmitter: Option<WrapTransmitter>,
    plugin: MedianPlugin,
}

type WrapTransmitter = Box<dyn FnOnce(Arc<InMemoryContract>) -> Arc<dyn ContractTransmitter>>;

impl DevnetBuilder {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            telemetry: Arc::new(NoopSink),
            data_sources: HashMap::new(),
            transmitter: None,
            plugin: MedianPlugin::default(),
        }
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Replace the random walk of oracle `index`.
    pub fn data_source(mut self, index: usize, source: Arc<dyn DataSource>) -> Self {
        self.data_sources.insert(index, source);
        self
    }

    /// Submit through whatever `wrap` builds around the contract instead
    /// of straight to it.
    pub fn transmitter<F>(mut self, wrap: F) -> Self
    where
        F: FnOnce(Arc<InMemoryContract>) -> Arc<dyn ContractTransmitter> + 'static,
    {
        self.transmitter = Some(Box::new(wrap));
        self
    }

    /// Generate keys, install the first committee and start every oracle.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(self) -> Result<Devnet, DevnetError> {
        self.config.validate()?;
        let n = self.config.devnet.committee_size;

        let offchain: Vec<_> = (0..n).map(|_| Arc::new(OffchainKeypair::generate())).collect();
        let onchain: Vec<_> = (0..n).map(|_| Arc::new(OnchainKeypair::generate())).collect();

        let committee = build_committee(&self.config, &offchain, &onchain, 1)?;
        let registry = Arc::new(ConfigRegistry::new());
        let committee = registry.install(committee)?;

        let contract = Arc::new(InMemoryContract::new(Arc::clone(&committee)));
        let transmitter: Arc<dyn ContractTransmitter> = match self.transmitter {
            Some(wrap) => wrap(Arc::clone(&contract)),
            None => contract.clone() as Arc<dyn ContractTransmitter>,
        };
        let network = InMemoryNetwork::new(self.config.devnet.mailbox_capacity);
        let pool = Arc::new(match self.config.verification_threads {
            0 => VerificationPool::with_default_threads()?,
            threads => VerificationPool::new(threads)?,
        });

        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut walks = Vec::with_capacity(n);
        let mut oracles = Vec::with_capacity(n);

        for i in 0..n {
            let walk = Arc::new(RandomWalkSource::new(
                self.config.data_source.initial_value,
                self.config.data_source.max_step,
            ));
            let data_source = match self.data_sources.get(&i) {
                Some(source) => Arc::clone(source),
                None => walk.clone() as Arc<dyn DataSource>,
            };
            walks.push(walk);

            let factory = DevnetOracle {
                offchain: Arc::clone(&offchain[i]),
                onchain: Arc::clone(&onchain[i]),
                network: network.clone(),
                telemetry: Arc::clone(&self.telemetry),
                data_source,
                contract: Arc::clone(&transmitter),
                transmission: self.config.transmission.clone(),
                plugin: self.plugin.clone(),
                pool: Arc::clone(&pool),
            };
            let supervisor = InstanceSupervisor::new(
                OracleId(i as u8),
                Arc::clone(&registry),
                Arc::new(factory),
                Arc::clone(&self.telemetry),
            );
            let running = supervisor.running();
            let (changes, changes_rx) = mpsc::channel(8);
            let handle = tokio::spawn(supervisor.run(changes_rx, shutdown_rx.clone()));
            oracles.push(OracleHandle {
                changes,
                running,
                handle,
            });
        }

        let devnet = Devnet {
            config: self.config,
            registry,
            network,
            contract,
            walks,
            offchain,
            onchain,
            oracles,
            shutdown,
        };
        devnet.announce(committee.digest);
        info!(n, f = committee.f, config_digest = %committee.digest, "devnet started");
        Ok(devnet)
    }
}

fn build_committee(
    config: &NodeConfig,
    offchain: &[Arc<OffchainKeypair>],
    onchain: &[Arc<OnchainKeypair>],
    config_count: u64,
) -> Result<CommitteeConfig, RegistryError> {
    let oracles = offchain
        .iter()
        .zip(onchain)
        .enumerate()
        .map(|(i, (off, on))| OracleIdentity {
            offchain_public_key: off.public_key(),
            onchain_signer: on.signer_address(),
            transmitter: transmitter_address(i),
            peer_id: format!("oracle-{i}"),
        })
        .collect();
    CommitteeConfig::new(
        config.devnet.chain_id,
        config.devnet.contract_address,
        config_count,
        oracles,
        config.devnet.fault_threshold,
        config.timings.clone(),
    )
}

fn transmitter_address(index: usize) -> Address {
    let mut address = [0u8; 20];
    address[0] = 0x7e;
    address[12..].copy_from_slice(&(index as u64).to_be_bytes());
    address
}

// =============================================================================
// RUNNING DEVNET
// =============================================================================

struct OracleHandle {
    changes: mpsc::Sender<ConfigDigest>,
    running: watch::Receiver<Option<ConfigDigest>>,
    handle: JoinHandle<()>,
}

/// A running local committee.
pub struct Devnet {
    config: NodeConfig,
    registry: Arc<ConfigRegistry>,
    network: InMemoryNetwork,
    contract: Arc<InMemoryContract>,
    walks: Vec<Arc<RandomWalkSource>>,
    offchain: Vec<Arc<OffchainKeypair>>,
    onchain: Vec<Arc<OnchainKeypair>>,
    oracles: Vec<OracleHandle>,
    shutdown: watch::Sender<bool>,
}

impl Devnet {
    pub fn builder(config: NodeConfig) -> DevnetBuilder {
        DevnetBuilder::new(config)
    }

    pub fn size(&self) -> usize {
        self.oracles.len()
    }

    pub fn committee(&self) -> Option<Arc<CommitteeConfig>> {
        self.registry.current()
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    pub fn network(&self) -> &InMemoryNetwork {
        &self.network
    }

    pub fn contract(&self) -> &Arc<InMemoryContract> {
        &self.contract
    }

    /// Default random walk of oracle `index` (unused if overridden).
    pub fn walk(&self, index: usize) -> Option<&Arc<RandomWalkSource>> {
        self.walks.get(index)
    }

    /// Digest oracle `index` is currently running.
    pub fn running(&self, index: usize) -> Option<watch::Receiver<Option<ConfigDigest>>> {
        self.oracles.get(index).map(|o| o.running.clone())
    }

    /// Send a configuration change to every supervisor.
    pub fn announce(&self, digest: ConfigDigest) {
        for (i, oracle) in self.oracles.iter().enumerate() {
            if oracle.changes.try_send(digest).is_err() {
                warn!(oracle = i, config_digest = %digest, "config change not delivered");
            }
        }
    }

    /// Install a new configuration with the same members and switch to it.
    pub fn reconfigure(&self) -> Result<ConfigDigest, DevnetError> {
        let next_count = self.registry.current().map_or(1, |c| c.config_count + 1);
        let committee = build_committee(&self.config, &self.offchain, &self.onchain, next_count)?;
        let committee = self.registry.install(committee)?;
        self.contract.set_config(Arc::clone(&committee));
        self.announce(committee.digest);
        info!(config_digest = %committee.digest, config_count = next_count, "devnet reconfigured");
        Ok(committee.digest)
    }

    /// Stop every oracle and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (i, oracle) in self.oracles.into_iter().enumerate() {
            if let Err(e) = oracle.handle.await {
                warn!(oracle = i, error = %e, "supervisor task panicked");
            }
        }
        info!("devnet stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.timings.delta_progress = Duration::from_millis(2_000);
        config.timings.delta_resend = Duration::from_millis(200);
        config.timings.delta_round = Duration::from_millis(50);
        config.timings.delta_grace = Duration::from_millis(20);
        config.timings.round_timeout = Duration::from_millis(500);
        config.transmission.initial_backoff = Duration::from_millis(20);
        config.transmission.max_backoff = Duration::from_millis(100);
        config.verification_threads = 2;
        config
    }

    async fn wait_for_digest(
        mut running: watch::Receiver<Option<ConfigDigest>>,
        digest: Option<ConfigDigest>,
    ) -> bool {
        tokio::time::timeout(Duration::from_secs(5), running.wait_for(|d| *d == digest))
            .await
            .is_ok_and(|r| r.is_ok())
    }

    #[test]
    fn test_transmitter_addresses_are_unique() {
        assert_ne!(transmitter_address(0), transmitter_address(1));
        assert_eq!(transmitter_address(3)[19], 3);
    }

    #[tokio::test]
    async fn test_devnet_transmits_reports() {
        let devnet = Devnet::builder(fast_config()).start().unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while devnet.contract().latest().is_none() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(devnet.contract().latest().is_some());
        devnet.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconfigure_restarts_instances() {
        let devnet = Devnet::builder(fast_config()).start().unwrap();
        let first = devnet.committee().unwrap().digest;
        assert!(wait_for_digest(devnet.running(0).unwrap(), Some(first)).await);

        let second = devnet.reconfigure().unwrap();
        assert_ne!(first, second);
        for i in 0..devnet.size() {
            assert!(wait_for_digest(devnet.running(i).unwrap(), Some(second)).await);
        }
        assert_eq!(devnet.contract().config_digest(), second);
        devnet.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_digest_halts_instance_not_process() {
        let devnet = Devnet::builder(fast_config()).start().unwrap();
        let first = devnet.committee().unwrap().digest;
        assert!(wait_for_digest(devnet.running(1).unwrap(), Some(first)).await);

        devnet.announce(ConfigDigest([0xEE; 32]));
        assert!(wait_for_digest(devnet.running(1).unwrap(), None).await);

        // A valid configuration brings it back
        devnet.announce(first);
        assert!(wait_for_digest(devnet.running(1).unwrap(), Some(first)).await);
        devnet.shutdown().await;
    }
}
