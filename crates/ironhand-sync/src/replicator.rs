//! Local replication loop: bus plus authority cell in one handle.
//!
//! This is the in-process stand-in for the real transport. The behavior
//! core talks to it through its `Replication` seam and never sees the
//! difference.

use crate::authority::{AuthorityCell, AuthorityError};
use crate::bus::EventBus;
use crate::events::{AgentEvent, ParticipantId};

#[derive(Debug)]
pub struct LocalReplicator {
    pub bus: EventBus,
    pub authority: AuthorityCell,
}

impl LocalReplicator {
    pub fn new(initial_authority: Option<ParticipantId>) -> Self {
        Self {
            bus: EventBus::new(),
            authority: AuthorityCell::new(initial_authority),
        }
    }

    pub fn broadcast(&mut self, event: &AgentEvent) {
        self.bus.broadcast(event);
    }

    /// Transfer authority to `to` in one step. Fails first-writer-wins
    /// if another transfer is in flight.
    pub fn request_authority(&mut self, to: ParticipantId) -> Result<(), AuthorityError> {
        let pending = self.authority.begin_transfer(to)?;
        self.authority.commit(pending);
        Ok(())
    }
}

impl Default for LocalReplicator {
    fn default() -> Self {
        Self::new(None)
    }
}
