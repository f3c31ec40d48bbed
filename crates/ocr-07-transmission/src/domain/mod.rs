//! Domain layer: retry policy and transmitter selection.

pub mod config;
pub mod errors;
pub mod selection;
