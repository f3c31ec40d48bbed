//! # Shared Types Crate
//!
//! Identity and timing types shared by every subsystem of the oracle node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `ConfigDigest`, `OracleId` and
//!   `ReportTimestamp` are defined once and reused by all crates.
//! - **Logical Time Only**: rounds are ordered by `(epoch, round)`, never by
//!   wall-clock time.

pub mod entities;
pub mod errors;
pub mod hashing;

pub use entities::*;
pub use errors::*;
pub use hashing::{keccak256, sha256};
