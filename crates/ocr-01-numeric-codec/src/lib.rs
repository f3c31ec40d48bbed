//! # Numeric Codec (OCR-01)
//!
//! Encodes bounded signed integers to a fixed-width, big-endian,
//! two's-complement byte string and back.
//!
//! The median plugin uses a 192-bit width, so every observation and every
//! report value occupies exactly 24 bytes on the wire:
//!
//! ```text
//! value in [-2^191, 2^191 - 1]
//!   v >= 0  ->  v
//!   v <  0  ->  2^192 + v
//! ```
//!
//! A codec is an explicit value constructed once at startup and handed to
//! whichever component needs it; there is no process-wide registry.

mod codec;
mod errors;

pub use codec::{NumericCodec, DEFAULT_BIT_WIDTH};
pub use errors::{CodecError, CodecResult};
pub use num_bigint::BigInt;
