//! Follower-side round bookkeeping.
//!
//! A follower answers only the epoch leader and only for strictly
//! increasing rounds, so a leader (faulty or not) can never make it sign
//! two different things for the same round.

use super::errors::{ProtocolError, ProtocolResult};
use shared_types::{Epoch, OracleId, ReportTimestamp, Round};

/// Per-epoch follower state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerState {
    epoch: Epoch,
    leader: OracleId,
    max_rounds: Round,
    observed_round: Round,
    reported_round: Round,
    completed_round: Round,
}

impl FollowerState {
    pub fn new(epoch: Epoch, leader: OracleId, max_rounds: Round) -> Self {
        Self {
            epoch,
            leader,
            max_rounds,
            observed_round: 0,
            reported_round: 0,
            completed_round: 0,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn leader(&self) -> OracleId {
        self.leader
    }

    /// Last round for which a report was delivered.
    pub fn completed_round(&self) -> Round {
        self.completed_round
    }

    /// Accept `ObserveReq` for `timestamp`.
    pub fn accept_observe_req(
        &mut self,
        from: OracleId,
        timestamp: &ReportTimestamp,
    ) -> ProtocolResult<()> {
        self.check_leader(from)?;
        self.check_round(timestamp)?;
        if timestamp.round <= self.observed_round {
            return Err(ProtocolError::StaleMessage("observe request not for a newer round"));
        }
        self.observed_round = timestamp.round;
        Ok(())
    }

    /// Accept `ReportReq` for `timestamp`.
    pub fn accept_report_req(
        &mut self,
        from: OracleId,
        timestamp: &ReportTimestamp,
    ) -> ProtocolResult<()> {
        self.check_leader(from)?;
        self.check_round(timestamp)?;
        if timestamp.round <= self.reported_round {
            return Err(ProtocolError::StaleMessage("report request not for a newer round"));
        }
        if timestamp.round < self.observed_round {
            return Err(ProtocolError::StaleMessage("report request behind observe request"));
        }
        self.reported_round = timestamp.round;
        self.observed_round = timestamp.round;
        Ok(())
    }

    /// Accept a final report for `timestamp`. Anyone may relay it.
    pub fn accept_final(&mut self, timestamp: &ReportTimestamp) -> ProtocolResult<()> {
        self.check_round(timestamp)?;
        if timestamp.round <= self.completed_round {
            return Err(ProtocolError::StaleMessage("final report already delivered"));
        }
        self.completed_round = timestamp.round;
        self.reported_round = self.reported_round.max(timestamp.round);
        self.observed_round = self.observed_round.max(timestamp.round);
        Ok(())
    }

    fn check_leader(&self, from: OracleId) -> ProtocolResult<()> {
        if from != self.leader {
            return Err(ProtocolError::NotLeader {
                expected: self.leader,
                actual: from,
            });
        }
        Ok(())
    }

    fn check_round(&self, timestamp: &ReportTimestamp) -> ProtocolResult<()> {
        if timestamp.epoch != self.epoch {
            return Err(ProtocolError::StaleMessage("wrong epoch"));
        }
        if timestamp.round == 0 || timestamp.round > self.max_rounds {
            return Err(ProtocolError::StaleMessage("round out of range"));
        }
        Ok(())
    }
}
