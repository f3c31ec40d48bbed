//! Domain layer for the pacemaker and report generation.
//!
//! Everything here is synchronous and free of I/O; the service drives it
//! from the message loop.

pub mod errors;
pub mod follower;
pub mod leader;
pub mod messages;
pub mod pacemaker;
pub mod timers;
