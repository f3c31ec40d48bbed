//! # Verification Pool
//!
//! Bounded rayon pool that fans out observation-signature checks and fans
//! the outcomes back in, in input order. Each worker owns a scratch
//! [`ObservationHasher`]; correctness never depends on that reuse.
//!
//! Work belonging to an abandoned round is cancelled through a shared
//! [`CancellationFlag`]: workers check it before every job and stop
//! verifying once it is set.

use crate::domain::entities::{OffchainPublicKey, SignedObservation};
use crate::domain::errors::{SigningError, SigningResult};
use crate::domain::wire::ObservationHasher;
use rayon::prelude::*;
use shared_types::{OracleId, Query, ReportTimestamp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Upper bound on worker threads when none is configured.
const MAX_DEFAULT_THREADS: usize = 4;

/// Cancellation signal shared between a round and its pending work.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One signature to check.
#[derive(Debug, Clone)]
pub struct VerificationJob {
    pub observer: OracleId,
    pub signed_observation: SignedObservation,
    pub public_key: OffchainPublicKey,
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    Invalid(SigningError),
    Cancelled,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// Fixed-size worker pool for signature verification.
pub struct VerificationPool {
    pool: rayon::ThreadPool,
}

impl VerificationPool {
    /// Create a pool with `threads` workers.
    pub fn new(threads: usize) -> SigningResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("ocr-verify-{i}"))
            .build()
            .map_err(|e| SigningError::PoolInit(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Pool sized to the machine, capped at a small number of workers.
    pub fn with_default_threads() -> SigningResult<Self> {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_DEFAULT_THREADS);
        Self::new(threads)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Verify every job; outcomes are returned in input order.
    pub fn verify_batch(
        &self,
        timestamp: &ReportTimestamp,
        query: &Query,
        jobs: &[VerificationJob],
        cancel: &CancellationFlag,
    ) -> Vec<VerificationOutcome> {
        self.pool.install(|| {
            jobs.par_iter()
                .map_init(ObservationHasher::new, |hasher, job| {
                    if cancel.is_cancelled() {
                        return VerificationOutcome::Cancelled;
                    }
                    match job.signed_observation.verify_with(
                        hasher,
                        timestamp,
                        query,
                        &job.public_key,
                    ) {
                        Ok(()) => VerificationOutcome::Valid,
                        Err(e) => {
                            trace!(
                                observer = %job.observer,
                                error = %e,
                                "observation signature rejected"
                            );
                            VerificationOutcome::Invalid(e)
                        }
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::keys::OffchainKeypair;
    use crate::ports::outbound::ObservationSigner;
    use shared_types::{ConfigDigest, Observation};

    fn ts() -> ReportTimestamp {
        ReportTimestamp::new(ConfigDigest([1u8; 32]), 9, 2)
    }

    fn jobs(count: usize) -> Vec<VerificationJob> {
        (0..count)
            .map(|i| {
                let keys = OffchainKeypair::generate();
                let signed = SignedObservation::sign(
                    &ts(),
                    &Query::default(),
                    Observation(vec![i as u8; 24]),
                    &keys,
                )
                .unwrap();
                VerificationJob {
                    observer: OracleId(i as u8),
                    signed_observation: signed,
                    public_key: keys.public_key(),
                }
            })
            .collect()
    }

    #[test]
    fn test_batch_preserves_order_and_flags_invalid() {
        let pool = VerificationPool::new(2).unwrap();
        let mut batch = jobs(6);
        batch[3].signed_observation.observation.0[0] ^= 0xFF;

        let outcomes =
            pool.verify_batch(&ts(), &Query::default(), &batch, &CancellationFlag::new());

        assert_eq!(outcomes.len(), 6);
        for (i, outcome) in outcomes.iter().enumerate() {
            if i == 3 {
                assert_eq!(outcome, &VerificationOutcome::Invalid(SigningError::InvalidSignature));
            } else {
                assert!(outcome.is_valid());
            }
        }
    }

    #[test]
    fn test_cancelled_batch_does_no_work() {
        let pool = VerificationPool::new(2).unwrap();
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let outcomes = pool.verify_batch(&ts(), &Query::default(), &jobs(4), &cancel);
        assert!(outcomes
            .iter()
            .all(|o| *o == VerificationOutcome::Cancelled));
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = VerificationPool::new(3).unwrap();
        assert_eq!(pool.threads(), 3);
        assert!(VerificationPool::with_default_threads().unwrap().threads() <= MAX_DEFAULT_THREADS);
    }
}
