//! Background work tied to one round.

use ocr_02_observation_signing::CancellationFlag;
use tokio::task::JoinHandle;

/// Tasks spawned for a round, cancelled together when the round ends.
///
/// Dropping the value cancels the work, so discarding an epoch's state is
/// enough to stop everything it started.
#[derive(Default)]
pub(crate) struct RoundWork {
    cancel: CancellationFlag,
    handles: Vec<JoinHandle<()>>,
}

impl RoundWork {
    /// Flag shared with the round's blocking jobs.
    pub(crate) fn cancel_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Cancel pending verification and abort outstanding tasks.
    pub(crate) fn abandon(&mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for RoundWork {
    fn drop(&mut self) {
        self.abandon();
    }
}
