//! # Committee Registry Subsystem (OCR-03)
//!
//! Holds the committee every protocol instance runs against: the ordered
//! oracle identities, the fault threshold `f`, the timing parameters, and
//! the [`ConfigDigest`](shared_types::ConfigDigest) that binds all of it to
//! one on-chain configuration.
//!
//! ## Components
//!
//! - [`CommitteeConfig`]: validated committee plus derived quorum sizes
//! - [`ProtocolTimings`]: operational intervals (configuration, not
//!   protocol constants)
//! - [`Rotation`]: deterministic leader/transmitter selection
//! - [`ConfigRegistry`]: known configurations keyed by digest
//!
//! ## Invariants
//!
//! - `1 <= n <= MAX_ORACLES` and `3f < n`
//! - Offchain keys, on-chain signers and transmitters are unique
//! - The digest stored in a config always matches its recomputed digest

pub mod domain;
pub mod registry;

pub use domain::committee::{config_digest, CommitteeConfig, CONFIG_DIGEST_PREFIX, MAX_ORACLES};
pub use domain::errors::{RegistryError, RegistryResult};
pub use domain::identity::OracleIdentity;
pub use domain::rotation::Rotation;
pub use domain::timings::ProtocolTimings;
pub use registry::ConfigRegistry;
