//! Fixed-width signed integer codec

use crate::errors::{CodecError, CodecResult};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed};

/// Bit width used by the median reporting plugin.
pub const DEFAULT_BIT_WIDTH: usize = 192;

/// Codec for signed integers bounded to `[-2^(W-1), 2^(W-1) - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericCodec {
    bit_width: usize,
    min: BigInt,
    max: BigInt,
    /// `2^W`
    modulus: BigInt,
}

impl NumericCodec {
    /// Create a codec for the given bit width.
    pub fn new(bit_width: usize) -> CodecResult<Self> {
        if bit_width == 0 || bit_width % 8 != 0 {
            return Err(CodecError::InvalidBitWidth(bit_width));
        }
        Ok(Self::with_width(bit_width))
    }

    fn with_width(bit_width: usize) -> Self {
        let modulus = BigInt::one() << bit_width;
        let half = BigInt::one() << (bit_width - 1);
        let max = &half - BigInt::one();
        let min = -half;

        Self {
            bit_width,
            min,
            max,
            modulus,
        }
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    /// Encoded length in bytes (`W / 8`).
    pub fn byte_width(&self) -> usize {
        self.bit_width / 8
    }

    pub fn min_value(&self) -> &BigInt {
        &self.min
    }

    pub fn max_value(&self) -> &BigInt {
        &self.max
    }

    /// Whether `value` lies inside the signed domain.
    pub fn contains(&self, value: &BigInt) -> bool {
        value >= &self.min && value <= &self.max
    }

    /// Encode `value` as `W/8` big-endian two's-complement bytes.
    ///
    /// Fails with `OutOfRange` rather than truncating.
    pub fn encode(&self, value: &BigInt) -> CodecResult<Vec<u8>> {
        if !self.contains(value) {
            return Err(self.out_of_range(value));
        }

        let unsigned: BigUint = if value.is_negative() {
            (value + &self.modulus).to_biguint()
        } else {
            value.to_biguint()
        }
        .ok_or_else(|| self.out_of_range(value))?;

        let digits = unsigned.to_bytes_be();
        let width = self.byte_width();
        if digits.len() > width {
            return Err(self.out_of_range(value));
        }

        let mut out = vec![0u8; width - digits.len()];
        out.extend_from_slice(&digits);
        Ok(out)
    }

    /// Decode exactly `W/8` bytes; the upper half of the unsigned range is
    /// negative.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<BigInt> {
        if bytes.len() != self.byte_width() {
            return Err(CodecError::InvalidLength {
                expected: self.byte_width(),
                actual: bytes.len(),
            });
        }

        let unsigned = BigInt::from_bytes_be(Sign::Plus, bytes);
        if unsigned > self.max {
            Ok(unsigned - &self.modulus)
        } else {
            Ok(unsigned)
        }
    }

    fn out_of_range(&self, value: &BigInt) -> CodecError {
        CodecError::OutOfRange {
            value: value.to_string(),
            bit_width: self.bit_width,
        }
    }
}

impl Default for NumericCodec {
    fn default() -> Self {
        Self::with_width(DEFAULT_BIT_WIDTH)
    }
}
