//! # Attested Report
//!
//! A report plus a quorum of signatures over its digest.
//!
//! ## Wire Format
//!
//! ```text
//! len(report)[4, BE] || report
//! || count[1] || count * ( signer[1] || r[32] || s[32] || v[1] )
//! ```

use super::errors::{AttestationError, AttestationResult};
use ocr_02_observation_signing::{verify_report_signature, EcdsaSignature};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::Report;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, OracleId, ReportTimestamp};
use std::collections::HashSet;

/// One member's signature over a report digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportSignature {
    pub signer: OracleId,
    pub signature: EcdsaSignature,
}

/// Report carrying at least `2f+1` signatures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestedReport {
    pub report: Report,
    /// Ordered by signer.
    pub signatures: Vec<ReportSignature>,
}

impl AttestedReport {
    pub fn timestamp(&self) -> &ReportTimestamp {
        &self.report.timestamp
    }

    pub fn digest(&self) -> Hash {
        self.report.digest()
    }

    /// Check the attestation the way an on-chain verifier would.
    pub fn verify(&self, committee: &CommitteeConfig) -> AttestationResult<()> {
        let actual = self.report.timestamp.config_digest;
        if actual != committee.digest {
            return Err(AttestationError::ConfigMismatch {
                expected: committee.digest,
                actual,
            });
        }

        let digest = self.digest();
        let mut seen = HashSet::with_capacity(self.signatures.len());
        for entry in &self.signatures {
            let identity = committee
                .oracle(entry.signer)
                .ok_or(AttestationError::UnknownSigner(entry.signer))?;
            if !seen.insert(entry.signer) {
                return Err(AttestationError::DuplicateSigner(entry.signer));
            }
            verify_report_signature(&digest, &entry.signature, &identity.onchain_signer).map_err(
                |source| AttestationError::InvalidSignature {
                    signer: entry.signer,
                    source,
                },
            )?;
        }

        if seen.len() < committee.quorum() {
            return Err(AttestationError::QuorumNotReached {
                got: seen.len(),
                required: committee.quorum(),
            });
        }
        Ok(())
    }

    /// Encode for on-chain submission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let report = self.report.to_bytes();
        let signatures_len = self.signatures.len() * (1 + EcdsaSignature::LEN);
        let mut out = Vec::with_capacity(4 + report.len() + 1 + signatures_len);
        out.extend_from_slice(&(report.len() as u32).to_be_bytes());
        out.extend_from_slice(&report);
        out.push(self.signatures.len() as u8);
        for entry in &self.signatures {
            out.push(entry.signer.0);
            out.extend_from_slice(&entry.signature.to_bytes());
        }
        out
    }

    /// Decode the submission encoding. Signatures are not checked.
    pub fn from_bytes(bytes: &[u8]) -> AttestationResult<Self> {
        let malformed = |what: &str| AttestationError::Malformed(what.to_string());

        let len_bytes: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| malformed("missing report length"))?;
        let report_len = u32::from_be_bytes(len_bytes) as usize;

        let report_end = 4usize
            .checked_add(report_len)
            .ok_or_else(|| malformed("report length overflow"))?;
        let report_bytes = bytes
            .get(4..report_end)
            .ok_or_else(|| malformed("truncated report"))?;
        let report = Report::from_bytes(report_bytes)
            .map_err(|e| AttestationError::Malformed(e.to_string()))?;

        let count = usize::from(
            *bytes
                .get(report_end)
                .ok_or_else(|| malformed("missing signature count"))?,
        );
        let entry_len = 1 + EcdsaSignature::LEN;
        let rest = &bytes[report_end + 1..];
        if rest.len() != count * entry_len {
            return Err(AttestationError::Malformed(format!(
                "expected {} signature bytes, got {}",
                count * entry_len,
                rest.len()
            )));
        }

        let signatures = rest
            .chunks_exact(entry_len)
            .map(|chunk| {
                let mut sig = [0u8; EcdsaSignature::LEN];
                sig.copy_from_slice(&chunk[1..]);
                ReportSignature {
                    signer: OracleId(chunk[0]),
                    signature: EcdsaSignature::from_bytes(&sig),
                }
            })
            .collect();

        Ok(Self { report, signatures })
    }
}
