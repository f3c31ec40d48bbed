//! # Adapter Implementations
//!
//! Concrete implementations of the protocol's outbound ports for the local
//! devnet.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     OUTER LAYER (Adapters)                          │
//! │               RandomWalkSource, InMemoryContract                    │
//! │                              ↑ implements ↑                         │
//! │                    MIDDLE LAYER (Ports)                             │
//! │            trait DataSource, trait ContractTransmitter              │
//! │                              ↑ uses ↑                               │
//! │                    INNER LAYER (Domain)                             │
//! │        Pacemaker, round drivers, aggregation, attestation           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod contract;
pub mod data_source;

pub use contract::{ContractError, InMemoryContract, Transmission};
pub use data_source::RandomWalkSource;
