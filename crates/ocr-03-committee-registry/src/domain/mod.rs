//! Domain layer for the committee registry.

pub mod committee;
pub mod errors;
pub mod identity;
pub mod rotation;
pub mod timings;
