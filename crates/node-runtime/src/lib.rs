//! # Node Runtime Library
//!
//! Everything the `node-runtime` binary wires together, exposed for the
//! integration tests.
//!
//! ## Modules
//!
//! - `config` - environment-driven node configuration
//! - `adapters` - devnet data source and in-memory contract
//! - `instance` - one pacemaker plus one transmission scheduler per committee
//! - `supervisor` - restarts the instance on configuration changes
//! - `devnet` - a whole committee in one process

#![allow(clippy::type_complexity)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod devnet;
pub mod instance;
pub mod supervisor;

pub use adapters::{ContractError, InMemoryContract, RandomWalkSource, Transmission};
pub use config::{ConfigError, DataSourceConfig, DevnetConfig, NodeConfig};
pub use devnet::{Devnet, DevnetBuilder, DevnetError};
pub use instance::{InstanceDependencies, ProtocolInstance};
pub use supervisor::{InstanceFactory, InstanceSupervisor, SupervisorError};
