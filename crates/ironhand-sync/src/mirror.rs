//! Observer-side view of a replicated agent.
//!
//! Non-authoritative participants never decide agent state; they fold
//! the event stream into this read-only mirror, in arrival order.

use crate::events::{state_code, AgentEvent, ParticipantId};

/// Mirrored agent state. All fields are written only by [`AgentMirror::apply`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AgentMirror {
    pub state: u8,
    pub target: Option<ParticipantId>,
    pub held_item: Option<String>,
    pub capture_target: Option<ParticipantId>,
}

impl AgentMirror {
    pub fn new() -> Self {
        Self {
            state: state_code::SEARCHING,
            ..Self::default()
        }
    }

    /// Fold one replicated event into the mirror.
    pub fn apply(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::TargetChanged { target } => self.target = *target,
            AgentEvent::StateChanged { state } => self.state = *state,
            AgentEvent::CaptureStarted { target } => self.capture_target = Some(*target),
            AgentEvent::CaptureReleased { .. } => self.capture_target = None,
            AgentEvent::ItemGrabbed { item } => self.held_item = Some(item.clone()),
            AgentEvent::ItemDropped { .. } => self.held_item = None,
            // A consuming use is followed by ItemDropped on the host, so
            // ItemUsed itself leaves held_item alone.
            AgentEvent::ItemUsed { .. } => {}
            AgentEvent::PassageUnlocked { .. } | AgentEvent::AnimationTrigger { .. } => {}
        }
    }
}
