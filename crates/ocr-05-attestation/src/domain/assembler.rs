//! # Attestation Assembler
//!
//! Leader-side collection of report signatures for one round.

use super::attested::{AttestedReport, ReportSignature};
use super::errors::{AttestationError, AttestationResult};
use ocr_02_observation_signing::{verify_report_signature, EcdsaSignature};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::Report;
use shared_types::{Hash, OracleId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Collects signatures over one report until a quorum is reached.
pub struct AttestationAssembler {
    report: Report,
    report_digest: Hash,
    committee: Arc<CommitteeConfig>,
    signatures: BTreeMap<OracleId, EcdsaSignature>,
}

impl AttestationAssembler {
    pub fn new(report: Report, committee: Arc<CommitteeConfig>) -> Self {
        let report_digest = report.digest();
        Self {
            report,
            report_digest,
            committee,
            signatures: BTreeMap::new(),
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn report_digest(&self) -> &Hash {
        &self.report_digest
    }

    /// Number of accepted signatures.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn has_quorum(&self) -> bool {
        self.len() >= self.committee.quorum()
    }

    /// Accept `signature` from `signer` over `digest`.
    ///
    /// Returns the number of accepted signatures.
    pub fn add_signature(
        &mut self,
        signer: OracleId,
        digest: &Hash,
        signature: EcdsaSignature,
    ) -> AttestationResult<usize> {
        let identity = self
            .committee
            .oracle(signer)
            .ok_or(AttestationError::UnknownSigner(signer))?;
        if digest != &self.report_digest {
            trace!(%signer, "report signature over a different report");
            return Err(AttestationError::ReportMismatch);
        }
        if self.signatures.contains_key(&signer) {
            return Err(AttestationError::DuplicateSigner(signer));
        }

        verify_report_signature(&self.report_digest, &signature, &identity.onchain_signer)
            .map_err(|source| AttestationError::InvalidSignature { signer, source })?;

        self.signatures.insert(signer, signature);
        Ok(self.signatures.len())
    }

    /// Produce the attested report, or `QuorumNotReached`.
    pub fn finalize(&self) -> AttestationResult<AttestedReport> {
        if !self.has_quorum() {
            return Err(AttestationError::QuorumNotReached {
                got: self.len(),
                required: self.committee.quorum(),
            });
        }

        Ok(AttestedReport {
            report: self.report.clone(),
            signatures: self
                .signatures
                .iter()
                .map(|(signer, signature)| ReportSignature {
                    signer: *signer,
                    signature: *signature,
                })
                .collect(),
        })
    }
}

/// `Collect(report, signatures) -> AttestedReport`
///
/// Invalid, mismatched and duplicate signatures are skipped.
pub fn collect<I>(
    report: Report,
    signatures: I,
    committee: Arc<CommitteeConfig>,
) -> AttestationResult<AttestedReport>
where
    I: IntoIterator<Item = (OracleId, Hash, EcdsaSignature)>,
{
    let mut assembler = AttestationAssembler::new(report, committee);
    for (signer, digest, signature) in signatures {
        if let Err(e) = assembler.add_signature(signer, &digest, signature) {
            trace!(%signer, error = %e, "skipping report signature");
        }
    }
    assembler.finalize()
}
