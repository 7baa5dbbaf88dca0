//! Communication-item monitoring loop.
//!
//! When the agent powers on a held communication item, this task keeps
//! a speaking linkage pointed at whichever participant is currently
//! targeted. Like the capture sequence it is a resumable routine polled
//! once per decision tick, never a separate thread.

use tracing::debug;

use ironhand_sync::ParticipantId;

use crate::session::Session;

#[derive(Debug, Default)]
pub struct CommLink {
    linked: Option<ParticipantId>,
    active: bool,
}

impl CommLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin monitoring. Declined unless the item is powered on and a
    /// target exists; the link is established on the next poll.
    pub fn start(&mut self, powered_on: bool, target: Option<ParticipantId>) -> bool {
        if !powered_on || target.is_none() {
            debug!("comm link not started, item off or no target");
            return false;
        }
        self.active = true;
        true
    }

    /// Tear the linkage down and deactivate.
    pub fn stop(&mut self, session: &mut Session) {
        self.unlink(session);
        self.active = false;
    }

    /// Advance the loop. `holding_comm` is whether the agent still
    /// holds a communication-capable item; once it does not, the loop
    /// terminates for good.
    pub fn poll(
        &mut self,
        target: Option<ParticipantId>,
        holding_comm: bool,
        session: &mut Session,
    ) {
        if !self.active {
            return;
        }
        if !holding_comm {
            debug!("comm item gone, terminating link");
            self.stop(session);
            return;
        }
        if target == self.linked {
            return;
        }
        // Target changed or lost: move the linkage. A lost target just
        // pauses the loop; it relinks once one is reacquired.
        self.unlink(session);
        if let Some(id) = target {
            if let Some(p) = session.participant_mut(id) {
                p.speaking_on_comm = true;
                self.linked = Some(id);
                debug!(target = id.0, "comm link established");
            }
        }
    }

    fn unlink(&mut self, session: &mut Session) {
        if let Some(id) = self.linked.take() {
            if let Some(p) = session.participant_mut(id) {
                p.speaking_on_comm = false;
            }
        }
    }
}
