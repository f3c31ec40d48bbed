//! Ports for report aggregation.

pub mod outbound;
