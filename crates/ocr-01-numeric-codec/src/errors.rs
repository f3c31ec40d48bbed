//! Codec error types

use thiserror::Error;

/// Errors produced while encoding or decoding bounded integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value does not fit into the signed domain of the codec.
    #[error("value {value} out of range for {bit_width}-bit signed integer")]
    OutOfRange { value: String, bit_width: usize },

    /// Input is not exactly `bit_width / 8` bytes long.
    #[error("invalid encoded length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Requested width is zero or not a whole number of bytes.
    #[error("invalid bit width {0}: must be a non-zero multiple of 8")]
    InvalidBitWidth(usize),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
