//! Ports layer

pub mod outbound;
