//! Protocol Service - the single message loop
//!
//! One [`OracleProtocol`] runs one committee configuration. It owns the
//! pacemaker, the round drivers and every protocol timer, and processes
//! inbound messages and timer expiry strictly one at a time. Work that
//! may take long (data source calls, batch verification, signing) runs on
//! spawned tasks tied to its round and is cancelled when the round ends.
//!
//! # Flow
//!
//! ```text
//! leader                                followers (leader included)
//!   │ ── ObserveReq ───────────────────▶ │ DataSource, sign
//!   │ ◀───────────────────── Observe ─── │
//!   │ (2f+1, grace)                      │
//!   │ ── ReportReq ────────────────────▶ │ Aggregate, sign report
//!   │ ◀────────────────────── Report ─── │
//!   │ (2f+1 signatures)                  │
//!   │ ── Final ────────────────────────▶ │ deliver, FinalEcho
//! ```

mod round_work;


use crate::domain::errors::{ProtocolError, ProtocolResult};
use crate::domain::follower::FollowerState;
use crate::domain::leader::{abandon_reason, LeaderState};
use crate::domain::messages::{ProtocolMessage, WireMessage};
use crate::domain::pacemaker::{Pacemaker, PacemakerAction};
use crate::domain::timers::{Deadlines, Timer};
use crate::ports::outbound::{
    DataSource, ObservationSigner, PeerTransport, ReportSigner, TelemetrySink,
};
use ocr_02_observation_signing::{
    AttributedSignedObservation, CancellationFlag, EcdsaSignature, SignedObservation,
    VerificationPool,
};
use ocr_03_committee_registry::CommitteeConfig;
use ocr_04_report_aggregation::{CollectOutcome, MedianPlugin};
use ocr_05_attestation::AttestedReport;
use round_work::RoundWork;
use shared_bus::{InboundMessage, OracleEvent};
use shared_types::{AbandonReason, Epoch, Hash, OracleId, Query, ReportTimestamp, Round};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Dependencies for OracleProtocol
pub struct ProtocolDependencies {
    /// This node's index in the committee.
    pub oracle_id: OracleId,
    pub committee: Arc<CommitteeConfig>,
    pub transport: Arc<dyn PeerTransport>,
    pub inbound: mpsc::Receiver<InboundMessage>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub observation_signer: Arc<dyn ObservationSigner>,
    pub report_signer: Arc<dyn ReportSigner>,
    pub data_source: Arc<dyn DataSource>,
    pub plugin: MedianPlugin,
    pub pool: Arc<VerificationPool>,
}

/// Read-only context shared with round tasks.
struct Shared {
    oracle_id: OracleId,
    committee: Arc<CommitteeConfig>,
    transport: Arc<dyn PeerTransport>,
    telemetry: Arc<dyn TelemetrySink>,
    observation_signer: Arc<dyn ObservationSigner>,
    report_signer: Arc<dyn ReportSigner>,
    data_source: Arc<dyn DataSource>,
    plugin: MedianPlugin,
    pool: Arc<VerificationPool>,
}

impl Shared {
    fn envelope(&self, body: ProtocolMessage) -> Option<Vec<u8>> {
        let kind = body.kind();
        match WireMessage::new(self.committee.digest, body).encode() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(kind, error = %e, "failed to encode message");
                None
            }
        }
    }

    fn send(&self, to: OracleId, body: ProtocolMessage) {
        if let Some(bytes) = self.envelope(body) {
            self.transport.send(to, bytes);
        }
    }

    fn broadcast(&self, body: ProtocolMessage) {
        if let Some(bytes) = self.envelope(body) {
            self.transport.broadcast(bytes);
        }
    }

    fn emit(&self, event: OracleEvent) {
        self.telemetry.emit(event);
    }

    fn round_abandoned(&self, timestamp: ReportTimestamp, reason: AbandonReason) {
        info!(oracle = %self.oracle_id, %timestamp, %reason, "round abandoned");
        self.emit(OracleEvent::RoundAbandoned {
            oracle: self.oracle_id,
            timestamp,
            reason,
        });
    }
}

/// Everything that only lives for one epoch.
struct EpochState {
    epoch: Epoch,
    leader: OracleId,
    follower: FollowerState,
    leader_state: Option<LeaderState>,
    round_started: Option<Instant>,
    work: BTreeMap<Round, RoundWork>,
}

impl EpochState {
    /// Drop work for every round before `round`.
    fn abandon_before(&mut self, round: Round) {
        let keep = self.work.split_off(&round);
        self.work = keep;
    }

    /// Drop work for `round` and every round before it.
    fn abandon_through(&mut self, round: Round) {
        match round.checked_add(1) {
            Some(next) => self.abandon_before(next),
            None => self.work.clear(),
        }
    }

    fn work_for(&mut self, round: Round) -> &mut RoundWork {
        self.work.entry(round).or_default()
    }
}

/// One oracle running one committee configuration.
pub struct OracleProtocol {
    shared: Arc<Shared>,
    inbound: mpsc::Receiver<InboundMessage>,
    pacemaker: Pacemaker,
    epoch_state: Option<EpochState>,
    deadlines: Deadlines,
    reports: watch::Sender<Option<AttestedReport>>,
}

impl OracleProtocol {
    /// Create a new OracleProtocol
    pub fn new(deps: ProtocolDependencies) -> Self {
        let pacemaker = Pacemaker::new(deps.oracle_id, &deps.committee);
        let (reports, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                oracle_id: deps.oracle_id,
                committee: deps.committee,
                transport: deps.transport,
                telemetry: deps.telemetry,
                observation_signer: deps.observation_signer,
                report_signer: deps.report_signer,
                data_source: deps.data_source,
                plugin: deps.plugin,
                pool: deps.pool,
            }),
            inbound: deps.inbound,
            pacemaker,
            epoch_state: None,
            deadlines: Deadlines::default(),
            reports,
        }
    }

    /// Newest attested report delivered by this node.
    ///
    /// Only the latest value is kept; a reader that falls behind skips
    /// straight to the freshest report.
    pub fn reports(&self) -> watch::Receiver<Option<AttestedReport>> {
        self.reports.subscribe()
    }

    pub fn oracle_id(&self) -> OracleId {
        self.shared.oracle_id
    }

    fn timings(&self) -> &ocr_03_committee_registry::ProtocolTimings {
        &self.shared.committee.timings
    }

    /// Run until `shutdown` flips to `true`, the transport closes, or a
    /// fatal condition stops the instance.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> ProtocolResult<()> {
        info!(
            oracle = %self.shared.oracle_id,
            config_digest = %self.shared.committee.digest,
            n = self.shared.committee.n(),
            f = self.shared.committee.f,
            "protocol instance starting"
        );
        if *shutdown.borrow() {
            return Ok(());
        }

        let now = Instant::now();
        self.deadlines.progress = Some(now + self.timings().delta_progress);
        self.deadlines.resend = Some(now + self.timings().delta_resend);
        let actions = self.pacemaker.start();
        self.apply(actions, now)?;

        loop {
            let deadline = self.deadlines.next();
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(oracle = %self.shared.oracle_id, "shutdown signal received");
                        break;
                    }
                }
                message = self.inbound.recv() => match message {
                    Some(message) => self.handle_message(message, Instant::now())?,
                    None => {
                        info!(oracle = %self.shared.oracle_id, "transport closed");
                        break;
                    }
                },
                _ = sleep_until(deadline) => self.handle_timers(Instant::now())?,
            }
        }

        // Dropping the epoch cancels its round work
        self.epoch_state = None;
        Ok(())
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    fn handle_message(&mut self, message: InboundMessage, now: Instant) -> ProtocolResult<()> {
        let from = message.from;
        match self.dispatch(from, &message.bytes, now) {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(ProtocolError::StaleMessage(reason)) => {
                trace!(oracle = %self.shared.oracle_id, %from, reason, "dropping stale message");
                Ok(())
            }
            Err(e) => {
                debug!(oracle = %self.shared.oracle_id, %from, error = %e, "message rejected");
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, from: OracleId, bytes: &[u8], now: Instant) -> ProtocolResult<()> {
        if !self.shared.committee.contains(from) {
            return Err(ProtocolError::UnknownSender(from));
        }
        let body = WireMessage::decode(bytes)?.open(&self.shared.committee.digest)?;

        match body {
            ProtocolMessage::NewEpoch { epoch } => {
                let actions = self.pacemaker.on_new_epoch(from, epoch)?;
                self.apply(actions, now)
            }
            ProtocolMessage::ObserveReq { timestamp, query } => {
                self.on_observe_req(from, timestamp, query)
            }
            ProtocolMessage::Observe {
                timestamp,
                signed_observation,
            } => self.on_observe(from, timestamp, signed_observation, now),
            ProtocolMessage::ReportReq {
                timestamp,
                query,
                observations,
            } => self.on_report_req(from, timestamp, query, observations),
            ProtocolMessage::Report {
                timestamp,
                report_digest,
                signature,
            } => self.on_report(from, timestamp, report_digest, signature, now),
            ProtocolMessage::Final {
                timestamp,
                attested_report,
            }
            | ProtocolMessage::FinalEcho {
                timestamp,
                attested_report,
            } => self.on_final(timestamp, attested_report, now),
        }
    }

    fn handle_timers(&mut self, now: Instant) -> ProtocolResult<()> {
        while let Some(timer) = self.deadlines.take_due(now) {
            match timer {
                Timer::Progress => {
                    info!(
                        oracle = %self.shared.oracle_id,
                        epoch = self.pacemaker.epoch(),
                        "no progress in epoch, requesting a new one"
                    );
                    self.deadlines.progress = Some(now + self.timings().delta_progress);
                    let actions = self.pacemaker.on_progress_timeout();
                    self.apply(actions, now)?;
                }
                Timer::Resend => {
                    self.deadlines.resend = Some(now + self.timings().delta_resend);
                    let actions = self.pacemaker.on_resend_timeout();
                    self.apply(actions, now)?;
                }
                Timer::Grace => self.begin_reporting(now),
                Timer::RoundTimeout => self.on_round_timeout(now),
                Timer::RoundStart => self.start_leader_round(now),
            }
        }
        Ok(())
    }

    // =========================================================================
    // PACEMAKER
    // =========================================================================

    fn apply(&mut self, actions: Vec<PacemakerAction>, now: Instant) -> ProtocolResult<()> {
        for action in actions {
            match action {
                PacemakerAction::BroadcastNewEpoch(epoch) => {
                    debug!(
                        oracle = %self.shared.oracle_id,
                        epoch,
                        "broadcasting new epoch request"
                    );
                    self.shared.broadcast(ProtocolMessage::NewEpoch { epoch });
                }
                PacemakerAction::StartEpoch { epoch, leader } => {
                    self.start_epoch(epoch, leader, now);
                }
                PacemakerAction::Halt(reason) => {
                    error!(oracle = %self.shared.oracle_id, %reason, "protocol instance halted");
                    self.shared.emit(OracleEvent::ProtocolHalted {
                        oracle: self.shared.oracle_id,
                        config_digest: self.shared.committee.digest,
                        reason: reason.clone(),
                    });
                    return Err(ProtocolError::Fatal(reason));
                }
            }
        }
        Ok(())
    }

    fn start_epoch(&mut self, epoch: Epoch, leader: OracleId, now: Instant) {
        if let Some(mut previous) = self.epoch_state.take() {
            let abandoned = previous
                .leader_state
                .as_mut()
                .and_then(LeaderState::abandon);
            if let Some((timestamp, _)) = abandoned {
                self.shared
                    .round_abandoned(timestamp, AbandonReason::EpochChanged);
            }
        }

        let timings = self.timings().clone();
        self.deadlines.clear_round();
        self.deadlines.progress = Some(now + timings.delta_progress);

        let me = self.shared.oracle_id;
        let leader_state = (leader == me).then(|| {
            self.deadlines.round_start = Some(now);
            LeaderState::new(epoch, timings.max_rounds_per_epoch)
        });
        self.epoch_state = Some(EpochState {
            epoch,
            leader,
            follower: FollowerState::new(epoch, leader, timings.max_rounds_per_epoch),
            leader_state,
            round_started: None,
            work: BTreeMap::new(),
        });

        info!(oracle = %me, epoch, %leader, "epoch started");
        self.shared.emit(OracleEvent::EpochStarted {
            oracle: me,
            config_digest: self.shared.committee.digest,
            epoch,
            leader,
        });
    }

    // =========================================================================
    // LEADER
    // =========================================================================

    fn start_leader_round(&mut self, now: Instant) {
        let Some(state) = self.epoch_state.as_mut() else {
            return;
        };
        let Some(leader) = state.leader_state.as_mut() else {
            return;
        };

        let started = leader.start_round(
            self.shared.committee.digest,
            Arc::clone(&self.shared.committee),
            &self.shared.plugin,
        );
        match started {
            Some((timestamp, query)) => {
                state.round_started = Some(now);
                self.deadlines.round_timeout =
                    Some(now + self.shared.committee.timings.round_timeout);
                self.pacemaker.note_leader_round(timestamp.round);

                info!(oracle = %self.shared.oracle_id, %timestamp, "round started");
                self.shared.emit(OracleEvent::RoundStarted {
                    oracle: self.shared.oracle_id,
                    timestamp,
                    leader: self.shared.oracle_id,
                });
                self.shared
                    .broadcast(ProtocolMessage::ObserveReq { timestamp, query });
            }
            None => {
                info!(
                    oracle = %self.shared.oracle_id,
                    epoch = state.epoch,
                    "round limit reached, waiting for the next epoch"
                );
            }
        }
    }

    fn on_observe(
        &mut self,
        from: OracleId,
        timestamp: ReportTimestamp,
        signed: SignedObservation,
        now: Instant,
    ) -> ProtocolResult<()> {
        let leader = self
            .epoch_state
            .as_mut()
            .and_then(|s| s.leader_state.as_mut())
            .ok_or(ProtocolError::StaleMessage("observation sent to a non-leader"))?;

        let outcome = match leader.on_observation(from, &timestamp, signed) {
            Ok(outcome) => outcome,
            Err(ProtocolError::Aggregation(e)) => {
                self.shared.emit(OracleEvent::ObservationRejected {
                    oracle: self.shared.oracle_id,
                    timestamp,
                    observer: from,
                    reason: e.as_label().to_string(),
                });
                return Err(ProtocolError::Aggregation(e));
            }
            Err(e) => return Err(e),
        };

        match outcome {
            CollectOutcome::Accepted => {}
            CollectOutcome::QuorumReached => {
                trace!(
                    oracle = %self.shared.oracle_id,
                    %timestamp,
                    "observation quorum, grace period started"
                );
                self.deadlines.grace = Some(now + self.shared.committee.timings.delta_grace);
            }
            CollectOutcome::Complete => self.begin_reporting(now),
        }
        Ok(())
    }

    fn begin_reporting(&mut self, now: Instant) {
        self.deadlines.grace = None;
        let Some(state) = self.epoch_state.as_mut() else {
            return;
        };
        let Some(leader) = state.leader_state.as_mut() else {
            return;
        };

        let timestamp =
            ReportTimestamp::new(self.shared.committee.digest, leader.epoch(), leader.round());
        match leader.begin_reporting(Arc::clone(&self.shared.committee)) {
            Ok((timestamp, query, observations)) => {
                debug!(
                    oracle = %self.shared.oracle_id,
                    %timestamp,
                    observations = observations.len(),
                    "requesting report signatures"
                );
                self.shared.broadcast(ProtocolMessage::ReportReq {
                    timestamp,
                    query,
                    observations,
                });
            }
            Err(ProtocolError::StaleMessage(_)) => {}
            Err(e) => {
                debug!(
                    oracle = %self.shared.oracle_id,
                    %timestamp,
                    error = %e,
                    "cannot build report"
                );
                self.shared.round_abandoned(timestamp, abandon_reason(&e));
                let started = state.round_started;
                let delta_round = self.shared.committee.timings.delta_round;
                schedule_next_round(&mut self.deadlines, started, delta_round, now);
            }
        }
    }

    fn on_report(
        &mut self,
        from: OracleId,
        timestamp: ReportTimestamp,
        report_digest: Hash,
        signature: EcdsaSignature,
        now: Instant,
    ) -> ProtocolResult<()> {
        let state = self
            .epoch_state
            .as_mut()
            .ok_or(ProtocolError::StaleMessage("no epoch"))?;
        let leader = state
            .leader_state
            .as_mut()
            .ok_or(ProtocolError::StaleMessage("report signature sent to a non-leader"))?;

        let attested =
            leader.on_report_signature(from, &timestamp, &report_digest, signature)?;
        let Some(attested) = attested else {
            return Ok(());
        };

        info!(
            oracle = %self.shared.oracle_id,
            %timestamp,
            signers = attested.signatures.len(),
            "report attested"
        );
        self.shared.broadcast(ProtocolMessage::Final {
            timestamp,
            attested_report: attested,
        });
        let started = state.round_started;
        let delta_round = self.shared.committee.timings.delta_round;
        schedule_next_round(&mut self.deadlines, started, delta_round, now);
        Ok(())
    }

    /// Report from whatever arrived if it is enough, otherwise give up.
    fn on_round_timeout(&mut self, now: Instant) {
        let observed = self
            .epoch_state
            .as_ref()
            .and_then(|s| s.leader_state.as_ref())
            .and_then(LeaderState::observation_count);
        match observed {
            Some(count) if count >= self.shared.committee.min_observations() => {
                debug!(
                    oracle = %self.shared.oracle_id,
                    observations = count,
                    "round timed out before quorum, reporting what arrived"
                );
                self.deadlines.round_timeout =
                    Some(now + self.shared.committee.timings.round_timeout);
                self.begin_reporting(now);
            }
            _ => self.abandon_leader_round(now),
        }
    }

    fn abandon_leader_round(&mut self, now: Instant) {
        let Some(state) = self.epoch_state.as_mut() else {
            return;
        };
        let Some(leader) = state.leader_state.as_mut() else {
            return;
        };
        if let Some((timestamp, reason)) = leader.abandon() {
            self.shared.round_abandoned(timestamp, reason);
        }
        let started = state.round_started;
        let delta_round = self.shared.committee.timings.delta_round;
        schedule_next_round(&mut self.deadlines, started, delta_round, now);
    }

    // =========================================================================
    // FOLLOWER
    // =========================================================================

    fn on_observe_req(
        &mut self,
        from: OracleId,
        timestamp: ReportTimestamp,
        query: Query,
    ) -> ProtocolResult<()> {
        let state = self
            .epoch_state
            .as_mut()
            .ok_or(ProtocolError::StaleMessage("no epoch"))?;
        state.follower.accept_observe_req(from, &timestamp)?;
        state.abandon_before(timestamp.round);

        let leader = state.leader;
        let shared = Arc::clone(&self.shared);
        let work = state.work_for(timestamp.round);
        let cancel = work.cancel_flag();
        work.push(tokio::spawn(observe(shared, leader, timestamp, query, cancel)));
        Ok(())
    }

    fn on_report_req(
        &mut self,
        from: OracleId,
        timestamp: ReportTimestamp,
        query: Query,
        observations: Vec<AttributedSignedObservation>,
    ) -> ProtocolResult<()> {
        if observations.len() > self.shared.committee.n() {
            return Err(ProtocolError::Decode(format!(
                "report request carries {} observations for {} members",
                observations.len(),
                self.shared.committee.n()
            )));
        }
        let state = self
            .epoch_state
            .as_mut()
            .ok_or(ProtocolError::StaleMessage("no epoch"))?;
        state.follower.accept_report_req(from, &timestamp)?;
        state.abandon_before(timestamp.round);

        let leader = state.leader;
        let shared = Arc::clone(&self.shared);
        let work = state.work_for(timestamp.round);
        let cancel = work.cancel_flag();
        work.push(tokio::spawn(sign_report(
            shared,
            leader,
            timestamp,
            query,
            observations,
            cancel,
        )));
        Ok(())
    }

    fn on_final(
        &mut self,
        timestamp: ReportTimestamp,
        attested: AttestedReport,
        now: Instant,
    ) -> ProtocolResult<()> {
        let state = self
            .epoch_state
            .as_mut()
            .ok_or(ProtocolError::StaleMessage("no epoch"))?;
        if timestamp.epoch != state.epoch {
            return Err(ProtocolError::StaleMessage("final report for another epoch"));
        }
        if attested.timestamp() != &timestamp {
            return Err(ProtocolError::StaleMessage("final report timestamp mismatch"));
        }
        if timestamp.round <= state.follower.completed_round() {
            return Err(ProtocolError::StaleMessage("final report already delivered"));
        }

        attested.verify(&self.shared.committee)?;
        state.follower.accept_final(&timestamp)?;
        state.abandon_through(timestamp.round);
        self.deadlines.progress = Some(now + self.shared.committee.timings.delta_progress);

        let signers = attested.signatures.len();
        self.reports.send_if_modified(|current| {
            let newer = current
                .as_ref()
                .map_or(true, |c| timestamp.is_newer_than(c.timestamp()));
            if newer {
                *current = Some(attested.clone());
            }
            newer
        });

        info!(oracle = %self.shared.oracle_id, %timestamp, signers, "report delivered");
        self.shared.emit(OracleEvent::ReportAttested {
            oracle: self.shared.oracle_id,
            timestamp,
            signers,
        });
        self.shared.broadcast(ProtocolMessage::FinalEcho {
            timestamp,
            attested_report: attested,
        });
        Ok(())
    }
}

// =============================================================================
// ROUND TASKS
// =============================================================================

/// Measure, encode and sign this node's observation, then send it to the
/// leader.
async fn observe(
    shared: Arc<Shared>,
    leader: OracleId,
    timestamp: ReportTimestamp,
    query: Query,
    cancel: CancellationFlag,
) {
    let value = match shared.data_source.observe(&timestamp).await {
        Ok(value) => value,
        Err(e) => {
            warn!(
                oracle = %shared.oracle_id,
                %timestamp,
                error = %e,
                "data source failed, skipping observation"
            );
            return;
        }
    };
    if cancel.is_cancelled() {
        return;
    }

    let observation = match shared.plugin.observation(&value) {
        Ok(observation) => observation,
        Err(e) => {
            warn!(oracle = %shared.oracle_id, %timestamp, error = %e, "observation out of range");
            return;
        }
    };

    match SignedObservation::sign(
        &timestamp,
        &query,
        observation,
        shared.observation_signer.as_ref(),
    ) {
        Ok(signed_observation) => shared.send(
            leader,
            ProtocolMessage::Observe {
                timestamp,
                signed_observation,
            },
        ),
        Err(e) => {
            warn!(oracle = %shared.oracle_id, %timestamp, error = %e, "failed to sign observation")
        }
    }
}

/// Re-run the aggregation the leader asked for, sign the report digest and
/// return the signature to the leader.
async fn sign_report(
    shared: Arc<Shared>,
    leader: OracleId,
    timestamp: ReportTimestamp,
    query: Query,
    observations: Vec<AttributedSignedObservation>,
    cancel: CancellationFlag,
) {
    let job = {
        let shared = Arc::clone(&shared);
        let cancel = cancel.clone();
        move || -> ProtocolResult<(Hash, EcdsaSignature)> {
            let report = shared.plugin.aggregate(
                &timestamp,
                &query,
                &observations,
                &shared.committee,
                &shared.pool,
                &cancel,
            )?;
            let digest = report.digest();
            let signature = shared
                .report_signer
                .sign_report(&digest)
                .map_err(|e| ProtocolError::Signing(e.to_string()))?;
            Ok((digest, signature))
        }
    };

    let result = tokio::task::spawn_blocking(job).await;
    if cancel.is_cancelled() {
        return;
    }
    match result {
        Ok(Ok((report_digest, signature))) => shared.send(
            leader,
            ProtocolMessage::Report {
                timestamp,
                report_digest,
                signature,
            },
        ),
        Ok(Err(e)) => {
            debug!(oracle = %shared.oracle_id, %timestamp, error = %e, "not signing report")
        }
        Err(e) => warn!(oracle = %shared.oracle_id, %timestamp, error = %e, "report job failed"),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Clear the round timers and let the next round start `delta_round` after
/// the previous one started, or now if that has already passed.
fn schedule_next_round(
    deadlines: &mut Deadlines,
    started: Option<Instant>,
    delta_round: Duration,
    now: Instant,
) {
    deadlines.clear_round();
    let earliest = started.map_or(now, |s| s + delta_round);
    deadlines.round_start = Some(earliest.max(now));
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
