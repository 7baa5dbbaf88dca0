//! Test doubles for the capability seams, shared by unit and scenario
//! tests across the crate.

use std::collections::HashMap;

use ironhand_sync::{LocalReplicator, ParticipantId};

use crate::hooks::{GazeTarget, Navigator, Presentation, SpatialQuery};
use crate::math::Vec3;

#[derive(Debug, Default)]
pub struct StubSpatial {
    pub visible_closest: Option<ParticipantId>,
    pub sensed_closest: Option<ParticipantId>,
    pub line_of_sight: bool,
    pub locked_passages: Vec<u64>,
    pub gazes: HashMap<ParticipantId, GazeTarget>,
}

impl SpatialQuery for StubSpatial {
    fn closest_participant(
        &self,
        _origin: Vec3,
        require_line_of_sight: bool,
    ) -> Option<ParticipantId> {
        if require_line_of_sight {
            self.visible_closest
        } else {
            self.sensed_closest
        }
    }

    fn line_of_sight(&self, _origin: Vec3, _target: Vec3) -> bool {
        self.line_of_sight
    }

    fn nearby_locked_passages(&self, _origin: Vec3, _radius: f32) -> Vec<u64> {
        self.locked_passages.clone()
    }

    fn gaze_target(&self, participant: ParticipantId) -> Option<GazeTarget> {
        self.gazes.get(&participant).copied()
    }
}

#[derive(Debug, Default)]
pub struct StubNav {
    pub destinations: Vec<Vec3>,
    pub velocity: Vec3,
    pub speed: f32,
}

impl Navigator for StubNav {
    fn set_destination(&mut self, point: Vec3, _check_reachable: bool) {
        self.destinations.push(point);
    }

    fn current_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
}

#[derive(Debug, Default)]
pub struct StubPresentation {
    pub cues: Vec<String>,
    pub triggers: Vec<String>,
    pub flags: HashMap<String, bool>,
    pub blends: HashMap<String, f32>,
    pub light: f32,
    pub prompt: bool,
}

impl Presentation for StubPresentation {
    fn play_cue(&mut self, name: &str) {
        self.cues.push(name.to_string());
    }

    fn set_animation_trigger(&mut self, name: &str) {
        self.triggers.push(name.to_string());
    }

    fn set_animation_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_string(), value);
    }

    fn set_blend_value(&mut self, name: &str, value: f32) {
        self.blends.insert(name.to_string(), value);
    }

    fn set_light_interpolation(&mut self, t: f32) {
        self.light = t;
    }

    fn set_interact_prompt(&mut self, enabled: bool) {
        self.prompt = enabled;
    }
}

pub fn replicator() -> LocalReplicator {
    LocalReplicator::new(None)
}
