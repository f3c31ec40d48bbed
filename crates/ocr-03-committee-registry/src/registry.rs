//! # Config Registry
//!
//! Known committee configurations keyed by digest. Protocol instances
//! resolve their digest here when they start; a digest that cannot be
//! resolved is configuration corruption and stops that instance.

use crate::domain::committee::CommitteeConfig;
use crate::domain::errors::{RegistryError, RegistryResult};
use parking_lot::RwLock;
use shared_types::ConfigDigest;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    configs: HashMap<ConfigDigest, Arc<CommitteeConfig>>,
    current: Option<ConfigDigest>,
}

/// Thread-safe store of committee configurations.
#[derive(Default)]
pub struct ConfigRegistry {
    state: RwLock<RegistryState>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and make it the current configuration.
    ///
    /// Re-installing the current digest is a no-op. Configurations with a
    /// lower `config_count` than the current one are rejected.
    pub fn install(&self, config: CommitteeConfig) -> RegistryResult<Arc<CommitteeConfig>> {
        config.validate()?;

        let mut state = self.state.write();
        if let Some(current) = state.current.and_then(|d| state.configs.get(&d)) {
            if current.digest == config.digest {
                debug!(config_digest = %config.digest, "config already installed");
                return Ok(Arc::clone(current));
            }
            if config.config_count <= current.config_count {
                return Err(RegistryError::StaleConfig {
                    current: current.config_count,
                    offered: config.config_count,
                });
            }
        }

        let digest = config.digest;
        info!(
            config_digest = %digest,
            config_count = config.config_count,
            n = config.n(),
            f = config.f,
            "installed committee config"
        );
        let config = Arc::new(config);
        state.configs.insert(digest, Arc::clone(&config));
        state.current = Some(digest);
        Ok(config)
    }

    /// Look up a configuration by digest.
    pub fn resolve(&self, digest: &ConfigDigest) -> RegistryResult<Arc<CommitteeConfig>> {
        self.state
            .read()
            .configs
            .get(digest)
            .cloned()
            .ok_or(RegistryError::UnknownConfigDigest(*digest))
    }

    /// The most recently installed configuration.
    pub fn current(&self) -> Option<Arc<CommitteeConfig>> {
        let state = self.state.read();
        state.current.and_then(|d| state.configs.get(&d).cloned())
    }

    pub fn len(&self) -> usize {
        self.state.read().configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
