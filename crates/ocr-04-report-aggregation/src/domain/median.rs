//! # Median Plugin
//!
//! `Aggregate(observations, committee) -> Report | InsufficientObservations`
//!
//! Signature checks fan out over the [`VerificationPool`]; the duplicate
//! bookkeeping that follows runs sequentially in input order.

use super::errors::{AggregationError, AggregationResult};
use super::report::Report;
use ocr_01_numeric_codec::{BigInt, CodecResult, NumericCodec};
use ocr_02_observation_signing::{
    AttributedSignedObservation, CancellationFlag, VerificationJob, VerificationOutcome,
    VerificationPool,
};
use ocr_03_committee_registry::CommitteeConfig;
use shared_types::{Observation, OracleId, Query, ReportTimestamp};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// An observation that passed every filter, with its decoded value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedObservation {
    pub observer: OracleId,
    pub observation: Observation,
    pub value: BigInt,
}

/// Median reporting plugin.
///
/// Cheap to clone; the codec is shared.
#[derive(Clone, Debug, Default)]
pub struct MedianPlugin {
    codec: Arc<NumericCodec>,
}

impl MedianPlugin {
    pub fn new(codec: NumericCodec) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    pub fn codec(&self) -> &NumericCodec {
        &self.codec
    }

    /// Query issued by the leader. The median plugin needs no round input.
    pub fn query(&self, _timestamp: &ReportTimestamp) -> Query {
        Query::default()
    }

    /// Encode a local measurement as an observation.
    pub fn observation(&self, value: &BigInt) -> CodecResult<Observation> {
        self.codec.encode(value).map(Observation)
    }

    /// Decode an observation, attributing failures to `observer`.
    pub fn decode(
        &self,
        observer: OracleId,
        observation: &Observation,
    ) -> AggregationResult<BigInt> {
        self.codec
            .decode(observation.as_bytes())
            .map_err(|source| AggregationError::InvalidValue { observer, source })
    }

    /// Verify, filter and aggregate a round's observations.
    pub fn aggregate(
        &self,
        timestamp: &ReportTimestamp,
        query: &Query,
        observations: &[AttributedSignedObservation],
        committee: &CommitteeConfig,
        pool: &VerificationPool,
        cancel: &CancellationFlag,
    ) -> AggregationResult<Report> {
        // Unknown observers have no key to verify against
        let candidates: Vec<&AttributedSignedObservation> = observations
            .iter()
            .filter(|o| {
                let known = committee.contains(o.observer);
                if !known {
                    trace!(observer = %o.observer, "dropping observation from non-member");
                }
                known
            })
            .collect();

        let jobs: Vec<VerificationJob> = candidates
            .iter()
            .filter_map(|o| {
                committee.offchain_key(o.observer).map(|key| VerificationJob {
                    observer: o.observer,
                    signed_observation: o.signed_observation.clone(),
                    public_key: *key,
                })
            })
            .collect();

        let outcomes = pool.verify_batch(timestamp, query, &jobs, cancel);
        if cancel.is_cancelled() || outcomes.contains(&VerificationOutcome::Cancelled) {
            return Err(AggregationError::Cancelled);
        }

        let mut seen = HashSet::with_capacity(committee.n());
        let mut accepted = Vec::with_capacity(committee.n());
        for (job, outcome) in jobs.iter().zip(outcomes) {
            if let VerificationOutcome::Invalid(e) = outcome {
                debug!(observer = %job.observer, error = %e, "discarding observation");
                continue;
            }
            if !seen.insert(job.observer) {
                trace!(observer = %job.observer, "discarding duplicate observation");
                continue;
            }
            let observation = job.signed_observation.observation.clone();
            match self.decode(job.observer, &observation) {
                Ok(value) => accepted.push(AcceptedObservation {
                    observer: job.observer,
                    observation,
                    value,
                }),
                Err(e) => debug!(error = %e, "discarding observation"),
            }
        }

        self.build_report(*timestamp, accepted, committee.min_observations())
    }

    /// Build the report from observations that already passed filtering.
    pub fn build_report(
        &self,
        timestamp: ReportTimestamp,
        mut accepted: Vec<AcceptedObservation>,
        required: usize,
    ) -> AggregationResult<Report> {
        if accepted.is_empty() || accepted.len() < required {
            return Err(AggregationError::InsufficientObservations {
                got: accepted.len(),
                required,
            });
        }

        accepted.sort_by(|a, b| a.value.cmp(&b.value).then(a.observer.cmp(&b.observer)));

        // Lower median keeps the result equal to a submitted value
        let median = accepted[(accepted.len() - 1) / 2].observation.clone();
        let (observers, observations) = accepted
            .into_iter()
            .map(|a| (a.observer, a.observation))
            .unzip();

        Ok(Report {
            timestamp,
            observers,
            observations,
            median,
        })
    }
}
