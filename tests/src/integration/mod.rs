//! Committee-level scenarios. Every test starts a four-member devnet with
//! `f = 1` and millisecond timings.

pub mod harness;

mod faults;
mod happy_path;
mod reconfiguration;
mod transmission;
