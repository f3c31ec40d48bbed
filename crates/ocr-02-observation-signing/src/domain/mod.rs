//! Domain layer: pure cryptographic logic, no I/O.

pub mod ecdsa;
pub mod ed25519;
pub mod entities;
pub mod errors;
pub mod wire;
