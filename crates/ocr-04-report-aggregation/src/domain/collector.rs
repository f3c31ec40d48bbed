//! # Observation Collector
//!
//! Leader-side bookkeeping for one round. Observations are verified as
//! they arrive and kept only if they pass every filter, so the working set
//! never exceeds the committee size.

use super::errors::{AggregationError, AggregationResult};
use super::median::{AcceptedObservation, MedianPlugin};
use super::report::Report;
use ocr_02_observation_signing::{AttributedSignedObservation, ObservationHasher, SignedObservation};
use ocr_03_committee_registry::CommitteeConfig;
use shared_types::{OracleId, Query, ReportTimestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Progress after an accepted observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Below quorum.
    Accepted,
    /// Exactly `2f+1` observations; the grace period starts now.
    QuorumReached,
    /// Every member has observed.
    Complete,
}

/// Verified observations for one round, keyed by observer.
pub struct ObservationCollector {
    timestamp: ReportTimestamp,
    query: Query,
    committee: Arc<CommitteeConfig>,
    plugin: MedianPlugin,
    hasher: ObservationHasher,
    accepted: BTreeMap<OracleId, (SignedObservation, AcceptedObservation)>,
}

impl ObservationCollector {
    pub fn new(
        timestamp: ReportTimestamp,
        query: Query,
        committee: Arc<CommitteeConfig>,
        plugin: MedianPlugin,
    ) -> Self {
        Self {
            timestamp,
            query,
            committee,
            plugin,
            hasher: ObservationHasher::new(),
            accepted: BTreeMap::new(),
        }
    }

    pub fn timestamp(&self) -> &ReportTimestamp {
        &self.timestamp
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn has_quorum(&self) -> bool {
        self.len() >= self.committee.quorum()
    }

    pub fn is_complete(&self) -> bool {
        self.len() >= self.committee.n()
    }

    /// Verify and record one observation.
    pub fn add(
        &mut self,
        observer: OracleId,
        timestamp: &ReportTimestamp,
        signed: SignedObservation,
    ) -> AggregationResult<CollectOutcome> {
        if timestamp != &self.timestamp {
            return Err(AggregationError::TimestampMismatch {
                expected: self.timestamp,
                actual: *timestamp,
            });
        }
        let key = self
            .committee
            .offchain_key(observer)
            .ok_or(AggregationError::UnknownObserver(observer))?;
        if self.accepted.contains_key(&observer) {
            return Err(AggregationError::DuplicateObserver(observer));
        }

        signed
            .verify_with(&mut self.hasher, &self.timestamp, &self.query, key)
            .map_err(|source| AggregationError::InvalidSignature { observer, source })?;
        let value = self.plugin.decode(observer, &signed.observation)?;

        let accepted = AcceptedObservation {
            observer,
            observation: signed.observation.clone(),
            value,
        };
        self.accepted.insert(observer, (signed, accepted));

        Ok(if self.is_complete() {
            CollectOutcome::Complete
        } else if self.len() == self.committee.quorum() {
            CollectOutcome::QuorumReached
        } else {
            CollectOutcome::Accepted
        })
    }

    /// Observations to forward to followers, ordered by observer.
    pub fn attributed(&self) -> Vec<AttributedSignedObservation> {
        self.accepted
            .iter()
            .map(|(observer, (signed, _))| {
                AttributedSignedObservation::new(signed.clone(), *observer)
            })
            .collect()
    }

    /// Aggregate what has been collected so far.
    pub fn build_report(&self) -> AggregationResult<Report> {
        let accepted = self.accepted.values().map(|(_, a)| a.clone()).collect();
        self.plugin
            .build_report(self.timestamp, accepted, self.committee.min_observations())
    }
}
