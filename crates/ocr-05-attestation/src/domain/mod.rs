//! Domain layer for attestation.

pub mod assembler;
pub mod attested;
pub mod errors;
