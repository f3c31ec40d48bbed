//! Leader-side round driver.
//!
//! Phases of one round: collect observations, then collect report
//! signatures. Only one round is in flight at a time.

use super::errors::{ProtocolError, ProtocolResult};
use ocr_02_observation_signing::{AttributedSignedObservation, EcdsaSignature, SignedObservation};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::{
    AggregationError, CollectOutcome, MedianPlugin, ObservationCollector,
};
use ocr_05_attestation::{AttestationAssembler, AttestedReport};
use shared_types::{
    AbandonReason, ConfigDigest, Epoch, Hash, OracleId, Query, ReportTimestamp, Round,
};
use std::sync::Arc;

/// Where the current round stands.
pub enum LeaderPhase {
    /// Between rounds.
    Idle,
    Observing(ObservationCollector),
    Reporting(AttestationAssembler),
    /// `r_max` rounds have run in this epoch.
    Exhausted,
}

/// Leader state for one epoch.
pub struct LeaderState {
    epoch: Epoch,
    round: Round,
    max_rounds: Round,
    phase: LeaderPhase,
}

impl LeaderState {
    pub fn new(epoch: Epoch, max_rounds: Round) -> Self {
        Self {
            epoch,
            round: 0,
            max_rounds,
            phase: LeaderPhase::Idle,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn phase(&self) -> &LeaderPhase {
        &self.phase
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.phase, LeaderPhase::Exhausted)
    }

    /// Valid observations so far, while observations are being collected.
    pub fn observation_count(&self) -> Option<usize> {
        match &self.phase {
            LeaderPhase::Observing(collector) => Some(collector.len()),
            _ => None,
        }
    }

    /// Start the next round, or `None` once `r_max` is reached.
    pub fn start_round(
        &mut self,
        config_digest: ConfigDigest,
        committee: Arc<CommitteeConfig>,
        plugin: &MedianPlugin,
    ) -> Option<(ReportTimestamp, Query)> {
        if self.round >= self.max_rounds {
            self.phase = LeaderPhase::Exhausted;
            return None;
        }
        self.round += 1;

        let timestamp = ReportTimestamp::new(config_digest, self.epoch, self.round);
        let query = plugin.query(&timestamp);
        self.phase = LeaderPhase::Observing(ObservationCollector::new(
            timestamp,
            query.clone(),
            committee,
            plugin.clone(),
        ));
        Some((timestamp, query))
    }

    /// Record an observation for the round being collected.
    pub fn on_observation(
        &mut self,
        from: OracleId,
        timestamp: &ReportTimestamp,
        signed: SignedObservation,
    ) -> ProtocolResult<CollectOutcome> {
        match &mut self.phase {
            LeaderPhase::Observing(collector) => Ok(collector.add(from, timestamp, signed)?),
            _ => Err(ProtocolError::StaleMessage("not collecting observations")),
        }
    }

    /// Stop collecting and move to signature collection.
    ///
    /// Returns what the `ReportReq` carries. If the collected observations
    /// do not make a report the round is over and the phase is `Idle`.
    pub fn begin_reporting(
        &mut self,
        committee: Arc<CommitteeConfig>,
    ) -> ProtocolResult<(ReportTimestamp, Query, Vec<AttributedSignedObservation>)> {
        let collector = match std::mem::replace(&mut self.phase, LeaderPhase::Idle) {
            LeaderPhase::Observing(collector) => collector,
            other => {
                self.phase = other;
                return Err(ProtocolError::StaleMessage("not collecting observations"));
            }
        };

        let report = collector.build_report()?;
        let request = (
            *collector.timestamp(),
            collector.query().clone(),
            collector.attributed(),
        );
        self.phase = LeaderPhase::Reporting(AttestationAssembler::new(report, committee));
        Ok(request)
    }

    /// Record a report signature; returns the attested report on quorum.
    pub fn on_report_signature(
        &mut self,
        from: OracleId,
        timestamp: &ReportTimestamp,
        report_digest: &Hash,
        signature: EcdsaSignature,
    ) -> ProtocolResult<Option<AttestedReport>> {
        let assembler = match &mut self.phase {
            LeaderPhase::Reporting(assembler) if assembler.report().timestamp == *timestamp => {
                assembler
            }
            _ => return Err(ProtocolError::StaleMessage("not collecting signatures for round")),
        };

        assembler.add_signature(from, report_digest, signature)?;
        if !assembler.has_quorum() {
            return Ok(None);
        }

        let attested = assembler.finalize()?;
        self.phase = LeaderPhase::Idle;
        Ok(Some(attested))
    }

    /// Drop the round in flight, reporting why it failed.
    pub fn abandon(&mut self) -> Option<(ReportTimestamp, AbandonReason)> {
        match std::mem::replace(&mut self.phase, LeaderPhase::Idle) {
            LeaderPhase::Observing(collector) => {
                Some((*collector.timestamp(), AbandonReason::InsufficientObservations))
            }
            LeaderPhase::Reporting(assembler) => {
                Some((assembler.report().timestamp, AbandonReason::QuorumNotReached))
            }
            LeaderPhase::Exhausted => {
                self.phase = LeaderPhase::Exhausted;
                None
            }
            LeaderPhase::Idle => None,
        }
    }
}

/// Map a reporting failure onto a round-level reason.
pub fn abandon_reason(error: &ProtocolError) -> AbandonReason {
    match error {
        ProtocolError::Aggregation(AggregationError::InsufficientObservations { .. }) => {
            AbandonReason::InsufficientObservations
        }
        _ => AbandonReason::QuorumNotReached,
    }
}
