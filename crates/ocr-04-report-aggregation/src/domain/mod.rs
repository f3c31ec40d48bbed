//! Domain layer for report aggregation.

pub mod collector;
pub mod errors;
pub mod median;
pub mod report;

#[cfg(test)]
pub(crate) mod fixtures;
