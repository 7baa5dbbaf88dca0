//! Target tracking: closest-participant selection with line-of-sight
//! fallback and re-target hysteresis.

use tracing::debug;

use ironhand_sync::ParticipantId;

use crate::hooks::SpatialQuery;
use crate::math::Vec3;
use crate::session::Session;

/// How long a just-dropped target stays ineligible for re-targeting.
pub const RETARGET_COOLDOWN_SECS: f32 = 5.0;

/// Result of a target query: the tracked target after the query, its
/// distance, and whether the query switched targets (callers broadcast
/// the switch and hand authority to the new target's owner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquired {
    pub id: ParticipantId,
    pub distance: f32,
    pub switched: bool,
}

/// Current/previous target pair with the hysteresis timer.
///
/// `previous` is a lagging copy of `current`: it catches up only after
/// the two have differed for the full cooldown window. While they
/// differ and the timer is running, the previous target is ineligible,
/// which is what prevents oscillation between two close candidates.
#[derive(Debug, Default)]
pub struct TargetTracker {
    current: Option<ParticipantId>,
    previous: Option<ParticipantId>,
    cooldown_elapsed: f32,
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ParticipantId> {
        self.current
    }

    /// Drop the current target. The hysteresis pair is untouched; the
    /// cooldown keeps running against the lagging previous target.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Advance the hysteresis timer. Once the window is consumed the
    /// previous target is forgotten and anyone is eligible again.
    pub fn tick_cooldown(&mut self, dt: f32) {
        if self.current != self.previous {
            if self.cooldown_elapsed > RETARGET_COOLDOWN_SECS {
                self.previous = self.current;
                self.cooldown_elapsed = 0.0;
            } else {
                self.cooldown_elapsed += dt;
            }
        }
    }

    /// Whether `id` may be targeted right now.
    pub fn eligible(&self, id: ParticipantId) -> bool {
        self.previous != Some(id) || self.cooldown_elapsed == 0.0
    }

    /// Switch to `id` if hysteresis allows it. Returns true when the
    /// current target actually changed.
    pub fn try_retarget(&mut self, id: ParticipantId) -> bool {
        if self.current == Some(id) {
            return false;
        }
        if !self.eligible(id) {
            debug!(candidate = id.0, "retarget blocked by cooldown");
            return false;
        }
        self.current = Some(id);
        true
    }

    /// Sense query used while searching: line-of-sight-restricted
    /// closest participant first, falling back to an unrestricted
    /// closest within `sense_range`.
    pub fn find_closest_in_range(
        &mut self,
        origin: Vec3,
        session: &Session,
        spatial: &dyn SpatialQuery,
        range: f32,
        sense_range: f32,
    ) -> Option<Acquired> {
        let (candidate, effective_range) = match spatial.closest_participant(origin, true) {
            Some(id) => (Some(id), range),
            // No visible participant; fall back to close-range sensing.
            None => (spatial.closest_participant(origin, false), sense_range),
        };
        let id = candidate?;
        let p = session.participant(id).filter(|p| p.is_eligible())?;
        let distance = origin.distance(p.position);
        if distance >= effective_range {
            return None;
        }
        let switched = self.current != Some(id) && self.try_retarget(id);
        // A blocked switch leaves us without a fresh acquisition.
        if self.current != Some(id) {
            return None;
        }
        Some(Acquired {
            id,
            distance,
            switched,
        })
    }

    /// Continuous re-validation used in active states: nearest eligible
    /// participant by straight-line distance, occlusion ignored. Ties
    /// are broken by iteration order (first minimal wins).
    pub fn refresh_closest_unconditional(
        &mut self,
        origin: Vec3,
        session: &Session,
    ) -> Option<Acquired> {
        let mut nearest: Option<(ParticipantId, f32)> = None;
        for p in session.eligible() {
            let distance = origin.distance(p.position);
            if nearest.map(|(_, best)| distance < best).unwrap_or(true) {
                nearest = Some((p.id, distance));
            }
        }
        let (candidate, _) = nearest?;

        let switched = self.current != Some(candidate) && self.try_retarget(candidate);

        let id = self.current?;
        let p = session.participant(id).filter(|p| p.is_eligible())?;
        Some(Acquired {
            id,
            distance: origin.distance(p.position),
            switched,
        })
    }
}
