//! Capability seams the behavior core consumes. The host engine (or a
//! test stub) supplies implementations at construction; the core never
//! inherits engine machinery.

use ironhand_sync::{AgentEvent, AuthorityError, LocalReplicator, ParticipantId};

use crate::math::Vec3;

/// What a gesturing participant is looking at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeTarget {
    /// Looking at the agent itself.
    Agent,
    /// Looking down at the ground.
    Ground,
    /// Looking at another participant.
    Participant(ParticipantId),
    /// Looking at a passage.
    Passage(u64),
}

/// Spatial queries answered by the engine's physics/visibility layer.
pub trait SpatialQuery {
    /// Closest participant to `origin`, optionally restricted to those
    /// with a clear line of sight.
    fn closest_participant(&self, origin: Vec3, require_line_of_sight: bool)
        -> Option<ParticipantId>;

    fn line_of_sight(&self, origin: Vec3, target: Vec3) -> bool;

    /// Locked passages within `radius` of `origin`.
    fn nearby_locked_passages(&self, origin: Vec3, radius: f32) -> Vec<u64>;

    /// What a participant's view ray currently hits, for gesture commands.
    fn gaze_target(&self, participant: ParticipantId) -> Option<GazeTarget>;
}

/// Path-following actuator. The core requests destinations and a speed;
/// it reads back velocity only, to drive animation blending.
pub trait Navigator {
    fn set_destination(&mut self, point: Vec3, check_reachable: bool);
    fn current_velocity(&self) -> Vec3;
    fn set_speed(&mut self, speed: f32);
}

/// Fire-and-forget presentation hooks. No return values; failures are
/// the presentation layer's problem.
pub trait Presentation {
    fn play_cue(&mut self, name: &str);
    fn set_animation_trigger(&mut self, name: &str);
    fn set_animation_flag(&mut self, name: &str, value: bool);
    fn set_blend_value(&mut self, name: &str, value: f32);
    /// 0.0 = calm presentation, 1.0 = fully enraged.
    fn set_light_interpolation(&mut self, t: f32);
    fn set_interact_prompt(&mut self, enabled: bool);
}

/// Replication transport: event broadcast plus authority handoff.
pub trait Replication {
    fn broadcast(&mut self, event: &AgentEvent);
    fn request_authority(&mut self, participant: ParticipantId) -> Result<(), AuthorityError>;
}

impl Replication for LocalReplicator {
    fn broadcast(&mut self, event: &AgentEvent) {
        LocalReplicator::broadcast(self, event);
    }

    fn request_authority(&mut self, participant: ParticipantId) -> Result<(), AuthorityError> {
        LocalReplicator::request_authority(self, participant)
    }
}

/// The injected capability bundle handed to the brain each tick.
pub struct AgentIo<'a> {
    pub spatial: &'a dyn SpatialQuery,
    pub nav: &'a mut dyn Navigator,
    pub presentation: &'a mut dyn Presentation,
    pub replication: &'a mut dyn Replication,
}
