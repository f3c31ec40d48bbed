//! # Report Aggregation Subsystem (OCR-04)
//!
//! The median reporting plugin. Turns a round's attributed signed
//! observations into a [`Report`] whose value is the lower median of the
//! surviving observations.
//!
//! ## Filtering Rules
//!
//! For each attributed observation, in arrival order:
//!
//! 1. The observer must be a member of the committee.
//! 2. The signature must verify against the observer's registered key.
//! 3. Only the first accepted observation per observer counts.
//! 4. The bytes must decode within the numeric codec's bounds.
//!
//! At least `f+1` observations must survive, otherwise the round is
//! abandoned with `InsufficientObservations`. No partial report is ever
//! produced.
//!
//! ## Determinism
//!
//! Surviving observations are sorted by `(value, observer)` before the
//! median is taken, so the report is independent of arrival order.

pub mod domain;
pub mod ports;

pub use domain::collector::{CollectOutcome, ObservationCollector};
pub use domain::errors::{AggregationError, AggregationResult};
pub use domain::median::{AcceptedObservation, MedianPlugin};
pub use domain::report::{Report, REPORT_HEADER_LEN};
pub use ports::outbound::{DataSource, DataSourceError};
