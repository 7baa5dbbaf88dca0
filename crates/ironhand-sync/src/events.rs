//! Replicated agent events — the shared vocabulary between the
//! authoritative host and every observer.

use serde::{Deserialize, Serialize};

/// Network identity of a session participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

/// Behavior-state wire codes carried in [`AgentEvent::StateChanged`].
pub mod state_code {
    pub const SEARCHING: u8 = 0;
    pub const FOLLOWING: u8 = 1;
    pub const CHASING: u8 = 2;
    pub const ESCALATING: u8 = 3;
    pub const CAPTURING: u8 = 4;
    pub const OPENING_PASSAGE: u8 = 5;
}

/// Events emitted by the authoritative host and applied by observers in
/// arrival order. Observers never decide these locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// The agent switched targets (or dropped its target).
    TargetChanged { target: Option<ParticipantId> },
    /// The behavior state machine transitioned. See [`state_code`].
    StateChanged { state: u8 },
    /// A capture sequence started against a participant — observers lock
    /// in the same visual sequence and anchor the victim to the agent.
    CaptureStarted { target: ParticipantId },
    /// The capture sequence released its victim. `finalized` is false
    /// when the sequence was cancelled and the victim survived.
    CaptureReleased {
        target: ParticipantId,
        finalized: bool,
    },
    /// The agent took an item into its carry point.
    ItemGrabbed { item: String },
    /// The agent returned an item to the world.
    ItemDropped { item: String },
    /// The agent used its held item.
    ItemUsed { item: String },
    /// A locked passage was unlocked (key consumed).
    PassageUnlocked { passage: u64 },
    /// Fire-and-forget animation trigger mirrored on all observers.
    AnimationTrigger { name: String },
}
