//! # Attestation Subsystem (OCR-05)
//!
//! Collects `2f+1` report signatures from distinct committee members over
//! byte-identical report serializations and produces an [`AttestedReport`]
//! ready for on-chain submission.
//!
//! ## Rules
//!
//! - Every signature is over `keccak256(report.to_bytes())`.
//! - A signature over any other digest is rejected with `ReportMismatch`
//!   and does not count toward the quorum.
//! - A signer counts at most once.
//! - Signatures are checked by recovering the on-chain signer address,
//!   exactly as the receiving contract does.
//! - Below quorum nothing is exposed: [`AttestationAssembler::finalize`]
//!   fails with `QuorumNotReached`.

pub mod domain;

pub use domain::assembler::{collect, AttestationAssembler};
pub use domain::attested::{AttestedReport, ReportSignature};
pub use domain::errors::{AttestationError, AttestationResult};
