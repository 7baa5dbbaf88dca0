//! Possession manager: the agent's single held item, its grab/drop
//! lifecycle, and the per-capability use dispatch.

use std::cmp::Ordering;

use tracing::{debug, warn};

use ironhand_sync::{AgentEvent, ParticipantId};

use crate::config::AgentOptions;
use crate::hooks::{Presentation, Replication, SpatialQuery};
use crate::item::{Item, ItemKind};
use crate::math::Vec3;
use crate::session::Session;

/// Carry weight beyond 1.0 slows the agent, capped at this penalty.
pub const MAX_CARRY_PENALTY: f32 = 0.4;

/// How far a key-capable item looks for a locked passage when used.
pub const KEY_PASSAGE_RADIUS: f32 = 10.0;

/// Side effects of `use_held` that the state machine must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    Nothing,
    /// A key found a locked passage; go open it.
    OpenPassage(u64),
    /// Toggle the communication monitoring loop.
    ToggleComm,
}

/// Owns the held item while the agent carries it. Ownership moves back
/// to the session's prop container on drop, in the same call.
#[derive(Debug, Default)]
pub struct PossessionManager {
    held: Option<Item>,
}

impl PossessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> Option<&Item> {
        self.held.as_ref()
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn holding_kind(&self, kind: ItemKind) -> bool {
        self.held.as_ref().map(|i| i.kind == kind).unwrap_or(false)
    }

    /// Movement speed multiplier from carry weight: linear falloff above
    /// weight 1.0, clamped at the maximum penalty.
    pub fn carry_speed_multiplier(&self) -> f32 {
        match &self.held {
            Some(item) => 1.0 - (item.weight - 1.0).clamp(0.0, MAX_CARRY_PENALTY),
            None => 1.0,
        }
    }

    /// Take the item a participant currently holds. Invalid references
    /// and refused two-handed items log and change nothing.
    pub fn grab_from(
        &mut self,
        session: &mut Session,
        participant: ParticipantId,
        agent_pos: Vec3,
        options: &AgentOptions,
        presentation: &mut dyn Presentation,
        replication: &mut dyn Replication,
    ) {
        let Some(p) = session.participant(participant) else {
            warn!(participant = participant.0, "grab from unknown participant");
            return;
        };
        let Some(item) = p.held_item() else {
            debug!(participant = participant.0, "grab failed: nothing held");
            return;
        };
        if item.two_handed && !options.can_carry_two_handed {
            debug!(item = %item.name, "grab refused: two-handed carry disabled");
            return;
        }

        if self.held.is_some() {
            self.drop_held(agent_pos, session, replication);
        }
        let Some(item) = session
            .participant_mut(participant)
            .and_then(|p| p.take_held_item())
        else {
            return;
        };
        presentation.set_animation_trigger("start_pickup");
        self.take_item(item, replication);
    }

    /// Take direct ownership of an item (e.g. capture remains). Drops
    /// any previous item first.
    pub fn grab_item(
        &mut self,
        item: Item,
        agent_pos: Vec3,
        session: &mut Session,
        replication: &mut dyn Replication,
    ) {
        if self.held.is_some() {
            self.drop_held(agent_pos, session, replication);
        }
        self.take_item(item, replication);
    }

    fn take_item(&mut self, mut item: Item, replication: &mut dyn Replication) {
        debug!(item = %item.name, "item taken into carry point");
        item.enemy_held = true;
        item.rest_position = None;
        replication.broadcast(&AgentEvent::ItemGrabbed {
            item: item.name.clone(),
        });
        self.held = Some(item);
    }

    /// Return the held item to the world. No-op when empty-handed, so
    /// calling twice is the same as calling once.
    pub fn drop_held(
        &mut self,
        agent_pos: Vec3,
        session: &mut Session,
        replication: &mut dyn Replication,
    ) {
        let Some(mut item) = self.held.take() else {
            debug!("drop requested while holding nothing");
            return;
        };
        item.enemy_held = false;
        item.rest_position = Some(Vec3::new(agent_pos.x, 0.0, agent_pos.z));
        replication.broadcast(&AgentEvent::ItemDropped {
            item: item.name.clone(),
        });
        session.store_prop(item);
    }

    /// Consume the held item outright (key spent on a passage). The item
    /// does not return to the world.
    pub fn consume_held(&mut self) -> Option<Item> {
        self.held.take()
    }

    /// Dispatch a use of the held item by capability. No-op when
    /// empty-handed. Item-specific failures are caught here and never
    /// propagate.
    pub fn use_held(
        &mut self,
        agent_pos: Vec3,
        session: &mut Session,
        spatial: &dyn SpatialQuery,
        presentation: &mut dyn Presentation,
        replication: &mut dyn Replication,
    ) -> UseOutcome {
        let (kind, name) = match &self.held {
            Some(item) => (item.kind, item.name.clone()),
            None => return UseOutcome::Nothing,
        };
        debug!(item = %name, ?kind, "using held item");

        match kind {
            ItemKind::Explosive => {
                presentation.play_cue("detonate");
                self.broadcast_used(&name, replication);
                self.drop_held(agent_pos, session, replication);
                UseOutcome::Nothing
            }
            ItemKind::Noisemaker => {
                // Fires in place; stays held.
                presentation.play_cue("noisemaker");
                self.broadcast_used(&name, replication);
                UseOutcome::Nothing
            }
            ItemKind::Extendable => {
                if let Some(item) = self.held.as_mut() {
                    if let Err(err) = item.use_generic() {
                        // The tool is normally player-operated and may
                        // reject us; that still counts as a deployment.
                        debug!(error = %err, "extendable refused non-player activation");
                    }
                }
                self.broadcast_used(&name, replication);
                self.drop_held(agent_pos, session, replication);
                UseOutcome::Nothing
            }
            ItemKind::IncendiaryPin => {
                if let Some(item) = self.held.as_mut() {
                    item.pin_armed = true;
                }
                presentation.set_animation_trigger("pull_pin");
                presentation.play_cue("pull_pin");
                self.broadcast_used(&name, replication);
                self.drop_held(agent_pos, session, replication);
                UseOutcome::Nothing
            }
            ItemKind::Key => {
                let nearest = spatial
                    .nearby_locked_passages(agent_pos, KEY_PASSAGE_RADIUS)
                    .into_iter()
                    .filter_map(|id| {
                        session
                            .passage(id)
                            .filter(|p| p.locked)
                            .map(|p| (id, agent_pos.distance(p.position)))
                    })
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
                match nearest {
                    Some((id, _)) => UseOutcome::OpenPassage(id),
                    None => UseOutcome::Nothing,
                }
            }
            ItemKind::Marking => {
                // Visual spraying is not implemented at this layer.
                debug!(item = %name, "marking use deferred");
                UseOutcome::Nothing
            }
            ItemKind::Communication => UseOutcome::ToggleComm,
            ItemKind::RangedReload => {
                let loaded = self
                    .held
                    .as_ref()
                    .map(|i| i.rounds_loaded > 0)
                    .unwrap_or(false);
                if !loaded {
                    // Using it empty would trigger a reload instead.
                    debug!(item = %name, "no rounds loaded, refusing use");
                    return UseOutcome::Nothing;
                }
                self.generic_use(&name, replication);
                UseOutcome::Nothing
            }
            ItemKind::Generic => {
                self.generic_use(&name, replication);
                UseOutcome::Nothing
            }
        }
    }

    fn generic_use(&mut self, name: &str, replication: &mut dyn Replication) {
        let result = match self.held.as_mut() {
            Some(item) => item.use_generic(),
            None => return,
        };
        match result {
            Ok(()) => self.broadcast_used(name, replication),
            Err(err) => debug!(item = %name, error = %err, "generic use failed"),
        }
    }

    fn broadcast_used(&self, name: &str, replication: &mut dyn Replication) {
        replication.broadcast(&AgentEvent::ItemUsed {
            item: name.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use crate::session::Passage;
    use crate::testutil::{replicator, StubPresentation, StubSpatial};

    const OWNER: ParticipantId = ParticipantId(1);

    fn session_with_holder(item: Item) -> Session {
        let mut session = Session::new();
        let mut p = Participant::new(OWNER, Vec3::ZERO);
        p.slots[0] = Some(item);
        session.add_participant(p);
        session
    }

    fn grab(manager: &mut PossessionManager, session: &mut Session) {
        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        manager.grab_from(
            session,
            OWNER,
            Vec3::ZERO,
            &AgentOptions::default(),
            &mut pres,
            &mut rep,
        );
    }

    #[test]
    fn drop_twice_is_a_no_op_second_time() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("lamp", ItemKind::Generic));
        let mut rep = replicator();
        grab(&mut manager, &mut session);
        assert!(manager.is_holding());

        manager.drop_held(Vec3::new(3.0, 1.0, 4.0), &mut session, &mut rep);
        assert!(!manager.is_holding());
        assert_eq!(session.props().len(), 1);
        assert_eq!(
            session.props()[0].rest_position,
            Some(Vec3::new(3.0, 0.0, 4.0))
        );

        manager.drop_held(Vec3::ZERO, &mut session, &mut rep);
        assert!(!manager.is_holding());
        assert_eq!(session.props().len(), 1, "second drop changed nothing");
    }

    #[test]
    fn grab_from_unknown_participant_changes_nothing() {
        let mut manager = PossessionManager::new();
        let mut session = Session::new();
        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        manager.grab_from(
            &mut session,
            ParticipantId(99),
            Vec3::ZERO,
            &AgentOptions::default(),
            &mut pres,
            &mut rep,
        );
        assert!(!manager.is_holding());
    }

    #[test]
    fn grab_refuses_two_handed_when_configured_off() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("crate", ItemKind::Generic).two_handed());
        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let options = AgentOptions {
            can_carry_two_handed: false,
            ..AgentOptions::default()
        };
        manager.grab_from(&mut session, OWNER, Vec3::ZERO, &options, &mut pres, &mut rep);
        assert!(!manager.is_holding());
        assert!(session.participant(OWNER).unwrap().has_any_item());
    }

    #[test]
    fn grabbing_while_holding_drops_the_old_item_first() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("lamp", ItemKind::Generic));
        grab(&mut manager, &mut session);

        session.participant_mut(OWNER).unwrap().slots[0] =
            Some(Item::new("horn", ItemKind::Noisemaker));
        grab(&mut manager, &mut session);

        assert_eq!(manager.held().unwrap().name, "horn");
        assert_eq!(session.props().len(), 1);
        assert_eq!(session.props()[0].name, "lamp");
    }

    #[test]
    fn explosive_use_detonates_then_drops() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("charge", ItemKind::Explosive));
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        let outcome = manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert_eq!(outcome, UseOutcome::Nothing);
        assert!(pres.cues.contains(&"detonate".to_string()));
        assert!(!manager.is_holding());
        assert_eq!(session.props().len(), 1);
    }

    #[test]
    fn noisemaker_stays_held_after_use() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("horn", ItemKind::Noisemaker));
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert!(manager.is_holding());
        assert!(pres.cues.contains(&"noisemaker".to_string()));
    }

    #[test]
    fn extendable_rejection_is_swallowed_and_item_dropped() {
        let mut manager = PossessionManager::new();
        let mut ladder = Item::new("ladder", ItemKind::Extendable);
        ladder.player_operated = true;
        let mut session = session_with_holder(ladder);
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        let outcome = manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert_eq!(outcome, UseOutcome::Nothing);
        assert!(!manager.is_holding(), "dropped despite the rejection");
        assert_eq!(session.props().len(), 1);
    }

    #[test]
    fn incendiary_pin_is_armed_before_dropping() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("grenade", ItemKind::IncendiaryPin));
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert!(!manager.is_holding());
        assert!(session.props()[0].pin_armed);
    }

    #[test]
    fn key_use_finds_the_nearest_locked_passage() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("key", ItemKind::Key));
        session.add_passage(Passage {
            id: 7,
            position: Vec3::new(8.0, 0.0, 0.0),
            locked: true,
        });
        session.add_passage(Passage {
            id: 8,
            position: Vec3::new(3.0, 0.0, 0.0),
            locked: true,
        });
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial {
            locked_passages: vec![7, 8],
            ..StubSpatial::default()
        };
        let outcome = manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert_eq!(outcome, UseOutcome::OpenPassage(8));
        assert!(manager.is_holding(), "key is kept until the passage opens");
    }

    #[test]
    fn key_use_without_passages_is_a_no_op() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("key", ItemKind::Key));
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        let outcome = manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);
        assert_eq!(outcome, UseOutcome::Nothing);
        assert!(manager.is_holding());
    }

    #[test]
    fn unloaded_ranged_item_refuses_use() {
        let mut manager = PossessionManager::new();
        let mut session = session_with_holder(Item::new("launcher", ItemKind::RangedReload));
        grab(&mut manager, &mut session);

        let mut pres = StubPresentation::default();
        let mut rep = replicator();
        let spatial = StubSpatial::default();
        let drained = rep.bus.subscribe();
        manager.use_held(Vec3::ZERO, &mut session, &spatial, &mut pres, &mut rep);

        assert!(manager.is_holding());
        assert_eq!(rep.bus.pending(drained), 0, "no use event broadcast");
    }

    #[test]
    fn carry_weight_penalty_is_capped() {
        let mut manager = PossessionManager::new();
        assert_eq!(manager.carry_speed_multiplier(), 1.0);

        let mut session = session_with_holder(Item::new("anvil", ItemKind::Generic).with_weight(9.0));
        grab(&mut manager, &mut session);
        assert!((manager.carry_speed_multiplier() - 0.6).abs() < 1e-6);

        let mut session = session_with_holder(Item::new("note", ItemKind::Generic).with_weight(1.2));
        grab(&mut manager, &mut session);
        assert!((manager.carry_speed_multiplier() - 0.8).abs() < 1e-6);
    }
}
