//! Driven ports (Outbound dependencies)
//!
//! The protocol loop owns no I/O of its own. Every capability it needs is
//! one of these traits, supplied through
//! [`ProtocolDependencies`](crate::service::ProtocolDependencies).

pub use ocr_02_observation_signing::{ObservationSigner, ReportSigner};
pub use ocr_04_report_aggregation::DataSource;
pub use shared_bus::{PeerTransport, TelemetrySink};
