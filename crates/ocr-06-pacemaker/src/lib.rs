//! # Pacemaker Subsystem (OCR-06)
//!
//! Drives the off-chain reporting protocol for one committee
//! configuration: epochs, leader election, and the rounds that turn
//! observations into attested reports.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): the pacemaker state machine, follower
//!   and leader round bookkeeping, protocol messages and timers. Pure and
//!   synchronous.
//! - **Ports Layer** (`ports/`): transport, telemetry, signing and data
//!   source capabilities.
//! - **Service Layer** (`service/`): [`OracleProtocol`], the single message
//!   loop that owns all protocol state.
//!
//! ## Liveness
//!
//! - Leader for epoch `e` is `leader_rotation.select(e)`.
//! - No delivered report for `delta_progress` makes a node ask for a new
//!   epoch; `2f+1` requests switch every honest node.
//! - A leader runs at most `r_max` rounds per epoch.
//!
//! ## Safety
//!
//! - Messages for another config digest, epoch or round are dropped.
//! - A follower answers only its epoch leader and only for increasing
//!   rounds.
//! - A final report is accepted only with `2f+1` valid signatures.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::{ProtocolError, ProtocolResult};
pub use domain::follower::FollowerState;
pub use domain::leader::{LeaderPhase, LeaderState};
pub use domain::messages::{ProtocolMessage, WireMessage, MAX_MESSAGE_SIZE};
pub use domain::pacemaker::{Pacemaker, PacemakerAction, PacemakerRole};
pub use domain::timers::{Deadlines, Timer};
pub use service::{OracleProtocol, ProtocolDependencies};
