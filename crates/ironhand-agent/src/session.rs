//! Explicit session context: participant registry, dropped-prop
//! container, locked passages, and the capture interaction lock.
//!
//! Passed into the core at construction time instead of being reached
//! through ambient globals.

use std::collections::HashMap;

use tracing::debug;

use ironhand_sync::ParticipantId;

use crate::item::Item;
use crate::math::Vec3;
use crate::participant::Participant;

/// Identity of one spawned agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub u64);

/// A lockable passage the agent can open with a key-capable item.
#[derive(Debug)]
pub struct Passage {
    pub id: u64,
    pub position: Vec3,
    pub locked: bool,
}

/// Proof that one agent holds the capture interaction lock on one
/// participant. Not cloneable: releasing consumes it, so the lock can
/// be released at most once.
#[derive(Debug)]
pub struct CaptureClaim {
    target: ParticipantId,
}

impl CaptureClaim {
    pub fn target(&self) -> ParticipantId {
        self.target
    }
}

#[derive(Debug, Default)]
pub struct Session {
    participants: HashMap<ParticipantId, Participant>,
    /// Items returned to the world after being dropped.
    props: Vec<Item>,
    passages: HashMap<u64, Passage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.insert(participant.id, participant);
    }

    /// Remove a disconnected participant entirely.
    pub fn remove_participant(&mut self, id: ParticipantId) {
        self.participants.remove(&id);
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// All connected, living participants. Iteration order is not
    /// deterministic; equal-distance tie-breaks downstream inherit that.
    pub fn eligible(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(|p| p.is_eligible())
    }

    /// Apply damage, clamping health at zero.
    pub fn damage(&mut self, id: ParticipantId, amount: i32) {
        if let Some(p) = self.participants.get_mut(&id) {
            p.health = (p.health - amount.max(0)).max(0);
        }
    }

    /// Force a participant's fear response.
    pub fn force_fear(&mut self, id: ParticipantId, level: f32) {
        if let Some(p) = self.participants.get_mut(&id) {
            p.fear = p.fear.max(level.clamp(0.0, 1.0));
        }
    }

    /// Deliver the kill at the end of a finalized capture. Returns the
    /// grabbable remains, if this participant leaves any.
    pub fn deliver_kill(&mut self, id: ParticipantId) -> Option<Item> {
        let p = self.participants.get_mut(&id)?;
        p.health = 0;
        p.dead = true;
        if p.remains_grabbable {
            Some(Item::remains(&format!("participant {}", id.0)))
        } else {
            None
        }
    }

    /// Freeze a captured participant to an agent-relative anchor.
    /// Called every frame for the duration of a capture sequence.
    pub fn pin_to_anchor(&mut self, id: ParticipantId, position: Vec3, facing: Vec3) {
        if let Some(p) = self.participants.get_mut(&id) {
            p.position = position;
            p.facing = facing;
        }
    }

    // -----------------------------------------------------------------
    // Capture interaction lock
    // -----------------------------------------------------------------

    /// Acquire the capture lock on `target` for `agent`. Declines if any
    /// agent already holds it, so a participant is captured by at most
    /// one agent at a time.
    pub fn try_begin_capture(
        &mut self,
        agent: AgentId,
        target: ParticipantId,
    ) -> Option<CaptureClaim> {
        let p = self.participants.get_mut(&target)?;
        if p.captured_by.is_some() {
            debug!(target = target.0, "capture declined: already locked");
            return None;
        }
        p.captured_by = Some(agent);
        p.in_special_interaction = true;
        Some(CaptureClaim { target })
    }

    /// Release the capture lock. Consumes the claim, so each acquired
    /// lock is released exactly once.
    pub fn release_capture(&mut self, claim: CaptureClaim) {
        if let Some(p) = self.participants.get_mut(&claim.target) {
            p.captured_by = None;
            p.in_special_interaction = false;
        }
    }

    // -----------------------------------------------------------------
    // Props and passages
    // -----------------------------------------------------------------

    /// Return a dropped item to the world's prop container.
    pub fn store_prop(&mut self, item: Item) {
        self.props.push(item);
    }

    pub fn props(&self) -> &[Item] {
        &self.props
    }

    pub fn add_passage(&mut self, passage: Passage) {
        self.passages.insert(passage.id, passage);
    }

    pub fn passage(&self, id: u64) -> Option<&Passage> {
        self.passages.get(&id)
    }

    pub fn unlock_passage(&mut self, id: u64) {
        if let Some(passage) = self.passages.get_mut(&id) {
            passage.locked = false;
        }
    }
}
