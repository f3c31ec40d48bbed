//! Protocol deadlines.
//!
//! The service keeps all timers in one struct and sleeps until the
//! earliest; an unset deadline never fires.

use tokio::time::Instant;

/// Timer identities, in the order they are handled when several are due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    /// No report delivered within `delta_progress`.
    Progress,
    /// Rebroadcast the pending `NewEpoch`.
    Resend,
    /// Grace period after the observation quorum.
    Grace,
    /// The leader's round ran out of time.
    RoundTimeout,
    /// Leader may start the next round.
    RoundStart,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deadlines {
    pub progress: Option<Instant>,
    pub resend: Option<Instant>,
    pub grace: Option<Instant>,
    pub round_timeout: Option<Instant>,
    pub round_start: Option<Instant>,
}

impl Deadlines {
    fn slots(&self) -> [(Timer, Option<Instant>); 5] {
        [
            (Timer::Progress, self.progress),
            (Timer::Resend, self.resend),
            (Timer::Grace, self.grace),
            (Timer::RoundTimeout, self.round_timeout),
            (Timer::RoundStart, self.round_start),
        ]
    }

    /// Earliest armed deadline.
    pub fn next(&self) -> Option<Instant> {
        self.slots().iter().filter_map(|(_, at)| *at).min()
    }

    /// Disarm and return the first timer due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<Timer> {
        let timer = self
            .slots()
            .iter()
            .find(|(_, at)| at.is_some_and(|at| at <= now))
            .map(|(timer, _)| *timer)?;
        *self.slot_mut(timer) = None;
        Some(timer)
    }

    /// Disarm the round timers, keeping the epoch-level ones.
    pub fn clear_round(&mut self) {
        self.grace = None;
        self.round_timeout = None;
        self.round_start = None;
    }

    fn slot_mut(&mut self, timer: Timer) -> &mut Option<Instant> {
        match timer {
            Timer::Progress => &mut self.progress,
            Timer::Resend => &mut self.resend,
            Timer::Grace => &mut self.grace,
            Timer::RoundTimeout => &mut self.round_timeout,
            Timer::RoundStart => &mut self.round_start,
        }
    }
}
