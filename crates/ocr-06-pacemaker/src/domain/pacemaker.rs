//! # Pacemaker
//!
//! Epoch state machine driving liveness. It never looks at the clock:
//! the service reports timer expiry and incoming `NewEpoch` messages, and
//! the pacemaker answers with the [`PacemakerAction`]s to perform.
//!
//! ## Rules
//!
//! - A node asks for epoch `max(e, ne) + 1` when progress stalls.
//! - Once more than `f` peers ask for an epoch above `ne`, the node joins
//!   the request with the `(f+1)`-th largest epoch (amplification).
//! - Once more than `2f` peers ask for an epoch above `e`, the node switches
//!   to the `(2f+1)`-th largest epoch and elects its leader.
//!
//! At most `f` faulty peers can neither force an epoch change nor hold one
//! back.

use super::errors::{ProtocolError, ProtocolResult};
use ocr_03_committee_registry::{CommitteeConfig, Rotation};
use shared_types::{Epoch, OracleId, Round};

/// Local role within the current epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacemakerRole {
    /// Not started.
    Idle,
    /// Following `leader`.
    Follower { leader: OracleId },
    /// Leading `epoch`, last started `round`.
    Leader { epoch: Epoch, round: Round },
    /// A move to `requested` was asked for and has not happened yet.
    AwaitingNewEpoch { requested: Epoch },
}

/// Side effects requested by the pacemaker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PacemakerAction {
    /// Broadcast `NewEpoch(epoch)` to every peer.
    BroadcastNewEpoch(Epoch),
    /// Switch to `epoch` under `leader`; round work of older epochs is void.
    StartEpoch { epoch: Epoch, leader: OracleId },
    /// Stop the instance.
    Halt(String),
}

/// Epoch state of one oracle.
#[derive(Debug)]
pub struct Pacemaker {
    me: OracleId,
    f: usize,
    n: usize,
    leader_rotation: Rotation,
    /// Current epoch `e`.
    epoch: Epoch,
    /// Highest epoch this node asked for, `ne`.
    ne: Epoch,
    /// Highest epoch requested by each peer.
    new_epoch: Vec<Epoch>,
    role: PacemakerRole,
}

impl Pacemaker {
    pub fn new(me: OracleId, committee: &CommitteeConfig) -> Self {
        Self {
            me,
            f: usize::from(committee.f),
            n: committee.n(),
            leader_rotation: committee.leader_rotation(),
            epoch: 0,
            ne: 0,
            new_epoch: vec![0; committee.n()],
            role: PacemakerRole::Idle,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn ne(&self) -> Epoch {
        self.ne
    }

    pub fn role(&self) -> PacemakerRole {
        self.role
    }

    /// Leader of `epoch` under this committee's rotation.
    pub fn leader_of(&self, epoch: Epoch) -> OracleId {
        self.leader_rotation.select(u64::from(epoch), self.n)
    }

    /// Leave `Idle` by asking for the first epoch.
    pub fn start(&mut self) -> Vec<PacemakerAction> {
        if self.role != PacemakerRole::Idle {
            return Vec::new();
        }
        self.request_new_epoch()
    }

    /// Progress stalled in the current epoch.
    pub fn on_progress_timeout(&mut self) -> Vec<PacemakerAction> {
        self.request_new_epoch()
    }

    /// Re-broadcast the pending request; the transport may have dropped it.
    ///
    /// Nothing is sent once the current epoch has caught up with `ne`.
    pub fn on_resend_timeout(&self) -> Vec<PacemakerAction> {
        if self.ne <= self.epoch {
            return Vec::new();
        }
        vec![PacemakerAction::BroadcastNewEpoch(self.ne)]
    }

    /// Record that this node, as leader, started `round`.
    pub fn note_leader_round(&mut self, round: Round) {
        if let PacemakerRole::Leader { epoch, .. } = self.role {
            self.role = PacemakerRole::Leader { epoch, round };
        }
    }

    /// Handle `NewEpoch(epoch)` from `from`.
    pub fn on_new_epoch(
        &mut self,
        from: OracleId,
        epoch: Epoch,
    ) -> ProtocolResult<Vec<PacemakerAction>> {
        let slot = self
            .new_epoch
            .get_mut(from.index())
            .ok_or(ProtocolError::UnknownSender(from))?;
        if epoch <= *slot {
            return Err(ProtocolError::StaleMessage("new epoch not above previous request"));
        }
        *slot = epoch;

        let mut sorted = self.new_epoch.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        let mut actions = Vec::new();

        let amplified = sorted[self.f];
        if amplified > self.ne {
            self.ne = amplified;
            if self.ne > self.epoch {
                self.role = PacemakerRole::AwaitingNewEpoch { requested: self.ne };
            }
            actions.push(PacemakerAction::BroadcastNewEpoch(self.ne));
        }

        if let Some(&agreed) = sorted.get(2 * self.f) {
            if agreed > self.epoch {
                self.epoch = agreed;
                self.ne = self.ne.max(agreed);
                let leader = self.leader_of(agreed);
                self.role = if leader == self.me {
                    PacemakerRole::Leader {
                        epoch: agreed,
                        round: 0,
                    }
                } else {
                    PacemakerRole::Follower { leader }
                };
                actions.push(PacemakerAction::StartEpoch {
                    epoch: agreed,
                    leader,
                });
            }
        }

        Ok(actions)
    }

    fn request_new_epoch(&mut self) -> Vec<PacemakerAction> {
        match self.epoch.max(self.ne).checked_add(1) {
            Some(next) => {
                self.ne = next;
                self.role = PacemakerRole::AwaitingNewEpoch { requested: next };
                vec![PacemakerAction::BroadcastNewEpoch(next)]
            }
            None => vec![PacemakerAction::Halt("epoch counter exhausted".into())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_03_committee_registry::{OracleIdentity, ProtocolTimings};

    fn committee(n: u8, f: u8) -> CommitteeConfig {
        let oracles = (0..n)
            .map(|i| OracleIdentity {
                offchain_public_key: [i + 1; 32],
                onchain_signer: [i + 1; 20],
                transmitter: [i + 101; 20],
                peer_id: format!("peer-{i}"),
            })
            .collect();
        CommitteeConfig::new(1, [9; 20], 1, oracles, f, ProtocolTimings::default()).unwrap()
    }

    fn pacemaker(me: u8) -> Pacemaker {
        Pacemaker::new(OracleId(me), &committee(4, 1))
    }

    #[test]
    fn test_start_requests_epoch_one() {
        let mut pm = pacemaker(0);
        assert_eq!(pm.role(), PacemakerRole::Idle);
        assert_eq!(pm.start(), vec![PacemakerAction::BroadcastNewEpoch(1)]);
        assert_eq!(pm.role(), PacemakerRole::AwaitingNewEpoch { requested: 1 });
        assert!(pm.start().is_empty());
    }

    #[test]
    fn test_switch_needs_two_f_plus_one() {
        let mut pm = pacemaker(0);
        pm.start();

        assert!(pm.on_new_epoch(OracleId(0), 1).unwrap().is_empty());
        // Second request amplifies nothing (ne is already 1) and does not switch
        assert!(pm.on_new_epoch(OracleId(1), 1).unwrap().is_empty());
        assert_eq!(pm.epoch(), 0);

        let actions = pm.on_new_epoch(OracleId(2), 1).unwrap();
        assert_eq!(
            actions,
            vec![PacemakerAction::StartEpoch {
                epoch: 1,
                leader: OracleId(1)
            }]
        );
        assert_eq!(pm.epoch(), 1);
        assert_eq!(pm.role(), PacemakerRole::Follower { leader: OracleId(1) });
    }

    #[test]
    fn test_amplification_after_f_plus_one() {
        let mut pm = pacemaker(3);
        assert!(pm.on_new_epoch(OracleId(0), 5).unwrap().is_empty());

        let actions = pm.on_new_epoch(OracleId(1), 5).unwrap();
        assert_eq!(actions, vec![PacemakerAction::BroadcastNewEpoch(5)]);
        assert_eq!(pm.ne(), 5);
        assert_eq!(pm.epoch(), 0);

        // Its own echo completes the 2f+1
        let actions = pm.on_new_epoch(OracleId(3), 5).unwrap();
        assert_eq!(
            actions,
            vec![PacemakerAction::StartEpoch {
                epoch: 5,
                leader: OracleId(1)
            }]
        );
    }

    #[test]
    fn test_single_faulty_peer_cannot_force_epoch() {
        let mut pm = pacemaker(0);
        assert!(pm.on_new_epoch(OracleId(2), 1_000).unwrap().is_empty());
        assert_eq!(pm.ne(), 0);
        assert_eq!(pm.epoch(), 0);
    }

    #[test]
    fn test_switch_takes_two_f_plus_one_largest() {
        let mut pm = pacemaker(0);
        pm.on_new_epoch(OracleId(1), 9).unwrap();
        pm.on_new_epoch(OracleId(2), 4).unwrap();
        let actions = pm.on_new_epoch(OracleId(3), 3).unwrap();

        assert!(actions.contains(&PacemakerAction::StartEpoch {
            epoch: 3,
            leader: OracleId(3)
        }));
        assert_eq!(pm.role(), PacemakerRole::Follower { leader: OracleId(3) });
        // ne follows the (f+1)-th largest request
        assert_eq!(pm.ne(), 4);
    }

    #[test]
    fn test_leader_role_and_round_tracking() {
        let mut pm = pacemaker(2);
        for peer in 0..3 {
            pm.on_new_epoch(OracleId(peer), 2).unwrap();
        }
        assert_eq!(pm.role(), PacemakerRole::Leader { epoch: 2, round: 0 });
        pm.note_leader_round(3);
        assert_eq!(pm.role(), PacemakerRole::Leader { epoch: 2, round: 3 });
    }

    #[test]
    fn test_stale_and_unknown_requests() {
        let mut pm = pacemaker(0);
        pm.on_new_epoch(OracleId(1), 4).unwrap();
        assert!(matches!(
            pm.on_new_epoch(OracleId(1), 4),
            Err(ProtocolError::StaleMessage(_))
        ));
        assert!(matches!(
            pm.on_new_epoch(OracleId(1), 2),
            Err(ProtocolError::StaleMessage(_))
        ));
        assert_eq!(
            pm.on_new_epoch(OracleId(9), 4),
            Err(ProtocolError::UnknownSender(OracleId(9)))
        );
    }

    #[test]
    fn test_progress_timeout_escalates() {
        let mut pm = pacemaker(0);
        pm.start();
        assert_eq!(
            pm.on_progress_timeout(),
            vec![PacemakerAction::BroadcastNewEpoch(2)]
        );
        assert_eq!(pm.on_resend_timeout(), vec![PacemakerAction::BroadcastNewEpoch(2)]);
    }

    #[test]
    fn test_resend_stops_after_switch() {
        let mut pm = pacemaker(0);
        assert!(pm.on_resend_timeout().is_empty());

        pm.start();
        assert_eq!(pm.on_resend_timeout(), vec![PacemakerAction::BroadcastNewEpoch(1)]);
        for peer in 0..3 {
            pm.on_new_epoch(OracleId(peer), 1).unwrap();
        }
        assert_eq!(pm.epoch(), 1);
        assert!(pm.on_resend_timeout().is_empty());

        // Still owed a resend while a higher request is outstanding
        assert_eq!(
            pm.on_progress_timeout(),
            vec![PacemakerAction::BroadcastNewEpoch(2)]
        );
        assert_eq!(pm.on_resend_timeout(), vec![PacemakerAction::BroadcastNewEpoch(2)]);
    }

    #[test]
    fn test_epoch_overflow_halts() {
        let mut pm = pacemaker(0);
        for peer in 0..3 {
            pm.on_new_epoch(OracleId(peer), Epoch::MAX).unwrap();
        }
        assert_eq!(pm.epoch(), Epoch::MAX);
        assert!(matches!(
            pm.on_progress_timeout().as_slice(),
            [PacemakerAction::Halt(_)]
        ));
    }

    #[test]
    fn test_single_node_committee() {
        let mut pm = Pacemaker::new(OracleId(0), &committee(1, 0));
        pm.start();
        let actions = pm.on_new_epoch(OracleId(0), 1).unwrap();
        assert!(actions.contains(&PacemakerAction::StartEpoch {
            epoch: 1,
            leader: OracleId(0)
        }));
    }
}
