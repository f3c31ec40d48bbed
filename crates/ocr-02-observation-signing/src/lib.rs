//! # Observation Signing Subsystem (OCR-02)
//!
//! Produces and checks the two kinds of signatures the protocol relies on:
//!
//! - **Observation signatures** (Ed25519, offchain key): detached signatures
//!   over the framed wire hash of `(config digest, epoch, round, query,
//!   observation)`.
//! - **Report signatures** (secp256k1 recoverable ECDSA, on-chain key):
//!   signatures over a report digest, checked by recovering the signer
//!   address exactly as a contract would.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): wire framing, signing and verification,
//!   no I/O
//! - **Ports Layer** (`ports/`): injected signing capabilities, so keys never
//!   need to live inside the protocol
//! - **Adapters** (`adapters/`): in-process key pairs implementing the ports
//! - **Pool** (`pool`): bounded rayon pool for batch verification with
//!   per-worker scratch hashers and round cancellation
//!
//! ## Security Notes
//!
//! - Length prefixes on the variable-size fields prevent ambiguity between
//!   query and observation bytes.
//! - High-S ECDSA signatures are rejected (EIP-2).
//! - Verification is pure and may run concurrently on shared inputs.

pub mod adapters;
pub mod domain;
pub mod pool;
pub mod ports;

// Re-export public API
pub use adapters::keys::{OffchainKeypair, OnchainKeypair};
pub use domain::ecdsa::{address_from_pubkey, recover_address, verify_report_signature};
pub use domain::entities::{
    AttributedSignedObservation, EcdsaSignature, ObservationSignature, OffchainPublicKey,
    SignedObservation,
};
pub use domain::errors::{SigningError, SigningResult};
pub use domain::wire::{observation_wire_hash, ObservationHasher};
pub use pool::{CancellationFlag, VerificationJob, VerificationOutcome, VerificationPool};
pub use ports::outbound::{ObservationSigner, ReportSigner, SignerError};
