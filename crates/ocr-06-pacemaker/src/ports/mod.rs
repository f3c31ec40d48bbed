//! Ports layer: the capabilities the protocol loop is built from.

pub mod outbound;
