//! Structured logging helpers.
//!
//! Every round-scoped line carries the same field set so log queries can
//! join on `config_digest`, `epoch` and `round`:
//! - `oracle`: emitting oracle index
//! - `config_digest`: committee configuration
//! - `epoch`, `round`: position in the protocol
//! - Additional context fields

/// Log a round-scoped event with the standard fields.
///
/// ```rust,ignore
/// log_round_event!(info, oracle, timestamp, "round abandoned", reason = %reason);
/// ```
#[macro_export]
macro_rules! log_round_event {
    ($level:ident, $oracle:expr, $timestamp:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            oracle = %$oracle,
            config_digest = %$timestamp.config_digest,
            epoch = $timestamp.epoch,
            round = $timestamp.round,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transmission event with the standard fields.
///
/// ```rust,ignore
/// log_transmission_event!(warn, oracle, timestamp, attempt, "transmission failed", error = %e);
/// ```
#[macro_export]
macro_rules! log_transmission_event {
    ($level:ident, $oracle:expr, $timestamp:expr, $attempt:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            oracle = %$oracle,
            config_digest = %$timestamp.config_digest,
            epoch = $timestamp.epoch,
            round = $timestamp.round,
            attempt = $attempt,
            $($($field)*,)?
            $msg
        )
    };
}
