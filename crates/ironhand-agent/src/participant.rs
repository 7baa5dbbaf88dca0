//! Participant data model: the networked player entities the agent
//! targets. The session creates and destroys these; the core only reads
//! them and writes interaction flags, fear, and health.

use ironhand_sync::ParticipantId;

use crate::item::Item;
use crate::math::Vec3;
use crate::session::AgentId;

/// Fixed number of carry slots per participant.
pub const SLOT_COUNT: usize = 4;

/// Gesture a participant can perform. Only the point gesture drives
/// agent commands; other codes are opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Point,
    Other(u8),
}

#[derive(Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub position: Vec3,
    pub facing: Vec3,
    /// Carry slots; `active_slot` indexes the currently-held item.
    pub slots: [Option<Item>; SLOT_COUNT],
    pub active_slot: usize,
    /// Health, clamped to >= 0 by all mutation paths.
    pub health: i32,
    pub fear: f32,
    pub connected: bool,
    pub dead: bool,
    /// Back-reference for the capture interaction lock.
    pub captured_by: Option<AgentId>,
    pub in_special_interaction: bool,
    pub gesture: Option<Gesture>,
    /// Linked as the speaking end of an agent-held communication item.
    pub speaking_on_comm: bool,
    /// Whether this participant leaves grabbable remains.
    pub remains_grabbable: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, position: Vec3) -> Self {
        Self {
            id,
            position,
            facing: Vec3::new(0.0, 0.0, 1.0),
            slots: Default::default(),
            active_slot: 0,
            health: 100,
            fear: 0.0,
            connected: true,
            dead: false,
            captured_by: None,
            in_special_interaction: false,
            gesture: None,
            speaking_on_comm: false,
            remains_grabbable: true,
        }
    }

    /// The item in the active slot, if any.
    pub fn held_item(&self) -> Option<&Item> {
        self.slots.get(self.active_slot).and_then(Option::as_ref)
    }

    /// Remove and return the item in the active slot.
    pub fn take_held_item(&mut self) -> Option<Item> {
        self.slots.get_mut(self.active_slot).and_then(Option::take)
    }

    /// Any slot occupied.
    pub fn has_any_item(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Targetable by an agent: still in the session and alive.
    pub fn is_eligible(&self) -> bool {
        self.connected && !self.dead
    }
}
