//! # Report
//!
//! The aggregate of one round and its canonical serialization. Report
//! signatures are over `keccak256(to_bytes())`, so two nodes that computed
//! the same aggregate always produce byte-identical reports.
//!
//! ## Layout
//!
//! ```text
//! config_digest[32] || epoch[4, BE] || round[1]
//! || count[1] || observers[count]
//! || width[1] || values[count * width]
//! || median[width]
//! ```
//!
//! `observers[i]` contributed `values[i]`; both are ordered by
//! `(value, observer)`.

use super::errors::{AggregationError, AggregationResult};
use ocr_01_numeric_codec::{BigInt, CodecResult, NumericCodec};
use serde::{Deserialize, Serialize};
use shared_types::{keccak256, ConfigDigest, Hash, Observation, OracleId, ReportTimestamp};

/// Bytes before the observer list: digest, epoch, round, count.
pub const REPORT_HEADER_LEN: usize = 32 + 4 + 1 + 1;

/// Aggregated round result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: ReportTimestamp,
    /// Contributing observers, in value order.
    pub observers: Vec<OracleId>,
    /// Encoded contributing values, aligned with `observers`.
    pub observations: Vec<Observation>,
    /// Encoded lower median; always one of `observations`.
    pub median: Observation,
}

impl Report {
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Decode the reported median.
    pub fn median_value(&self, codec: &NumericCodec) -> CodecResult<BigInt> {
        codec.decode(self.median.as_bytes())
    }

    /// Canonical serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        let width = self.median.len();
        let mut out =
            Vec::with_capacity(REPORT_HEADER_LEN + self.len() * (1 + width) + 1 + width);

        out.extend_from_slice(self.timestamp.config_digest.as_bytes());
        out.extend_from_slice(&self.timestamp.epoch.to_be_bytes());
        out.push(self.timestamp.round);
        out.push(self.observers.len() as u8);
        out.extend(self.observers.iter().map(|o| o.0));
        out.push(width as u8);
        for observation in &self.observations {
            out.extend_from_slice(observation.as_bytes());
        }
        out.extend_from_slice(self.median.as_bytes());
        out
    }

    /// Digest that report signatures are produced over.
    pub fn digest(&self) -> Hash {
        keccak256(&self.to_bytes())
    }

    /// Parse the canonical serialization.
    pub fn from_bytes(bytes: &[u8]) -> AggregationResult<Self> {
        let malformed = |what: &str| AggregationError::MalformedReport(what.to_string());

        if bytes.len() < REPORT_HEADER_LEN {
            return Err(malformed("truncated header"));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[..32]);
        let mut epoch = [0u8; 4];
        epoch.copy_from_slice(&bytes[32..36]);
        let round = bytes[36];
        let count = usize::from(bytes[37]);

        let mut cursor = REPORT_HEADER_LEN;
        let observers: Vec<OracleId> = bytes
            .get(cursor..cursor + count)
            .ok_or_else(|| malformed("truncated observers"))?
            .iter()
            .map(|&b| OracleId(b))
            .collect();
        cursor += count;

        let width = usize::from(*bytes.get(cursor).ok_or_else(|| malformed("missing width"))?);
        cursor += 1;
        if width == 0 {
            return Err(malformed("zero value width"));
        }

        let expected = cursor + (count + 1) * width;
        if bytes.len() != expected {
            return Err(AggregationError::MalformedReport(format!(
                "expected {expected} bytes, got {}",
                bytes.len()
            )));
        }

        let observations = bytes[cursor..cursor + count * width]
            .chunks_exact(width)
            .map(|chunk| Observation(chunk.to_vec()))
            .collect();
        let median = Observation(bytes[cursor + count * width..].to_vec());

        Ok(Self {
            timestamp: ReportTimestamp::new(
                ConfigDigest(digest),
                u32::from_be_bytes(epoch),
                round,
            ),
            observers,
            observations,
            median,
        })
    }
}
