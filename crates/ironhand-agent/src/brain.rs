//! The behavior state machine driving one agent.
//!
//! Two cadences: `update` runs every frame (blending, light, prompt,
//! anchor mirroring, aggression, stun edges, capture polling) and
//! `decide` runs on the slower decision tick (state transitions, target
//! re-validation, movement goals). Contact, interact, and hit events
//! arrive through dedicated entry points.

use rand::Rng;

use tracing::{debug, warn};

use ironhand_sync::{state_code, AgentEvent, ParticipantId};

use crate::aggression::{Aggression, Drive};
use crate::capture::{CaptureSequence, CaptureStatus};
use crate::comms::CommLink;
use crate::config::AgentOptions;
use crate::gesture::{GestureCommand, GestureWatch};
use crate::hooks::{AgentIo, Replication};
use crate::item::ItemKind;
use crate::math::{exp_lerp, signed_angle_xz, yaw_toward, Vec3};
use crate::participant::{Gesture, Participant};
use crate::possession::{PossessionManager, UseOutcome};
use crate::session::{AgentId, Session};
use crate::targeting::TargetTracker;

/// Acquisition range while searching, with line of sight.
pub const SEARCH_RANGE: f32 = 25.0;

/// Close-range sensing fallback when nobody is visible.
pub const SENSE_RANGE: f32 = 3.0;

/// Beyond this, an occluded target is abandoned.
pub const FOLLOW_RANGE: f32 = 20.0;

/// The agent walks to a point this far short of its target.
pub const FOLLOW_OFFSET: f32 = 3.0;

/// Destination updates are skipped inside this arrival radius.
pub const ARRIVE_RADIUS: f32 = 0.5;

/// A key works on a passage from this close.
pub const PASSAGE_REACH: f32 = 2.0;

/// Radius of the passive wander around the current position.
pub const WANDER_RADIUS: f32 = 10.0;

/// Captured victims are pinned this far in front of the agent.
pub const ANCHOR_OFFSET: f32 = 1.0;

pub const SEARCH_SPEED: f32 = 3.0;
pub const FOLLOW_SPEED: f32 = 5.0;
pub const CHASE_SPEED: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Searching,
    Following,
    Chasing,
    Escalating,
    Capturing,
    OpeningPassage,
}

impl BehaviorState {
    /// Wire code for [`AgentEvent::StateChanged`].
    pub fn code(self) -> u8 {
        match self {
            BehaviorState::Searching => state_code::SEARCHING,
            BehaviorState::Following => state_code::FOLLOWING,
            BehaviorState::Chasing => state_code::CHASING,
            BehaviorState::Escalating => state_code::ESCALATING,
            BehaviorState::Capturing => state_code::CAPTURING,
            BehaviorState::OpeningPassage => state_code::OPENING_PASSAGE,
        }
    }
}

/// Per-tick input snapshot: the agent's own transform and stun signal,
/// read from the host before either cadence runs.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub dt: f32,
    pub position: Vec3,
    pub facing: Vec3,
    pub stun_active: bool,
}

pub struct AgentBrain {
    id: AgentId,
    options: AgentOptions,
    state: BehaviorState,
    targeting: TargetTracker,
    aggression: Aggression,
    possession: PossessionManager,
    capture: Option<CaptureSequence>,
    comms: CommLink,
    gesture: GestureWatch,
    pending_passage: Option<u64>,
    wander_goal: Option<Vec3>,
    stunned: bool,
    blend_x: f32,
    blend_z: f32,
    yaw: f32,
}

impl AgentBrain {
    pub fn new(id: AgentId, options: AgentOptions) -> Self {
        Self {
            id,
            options,
            state: BehaviorState::Searching,
            targeting: TargetTracker::new(),
            aggression: Aggression::default(),
            possession: PossessionManager::new(),
            capture: None,
            comms: CommLink::new(),
            gesture: GestureWatch::new(),
            pending_passage: None,
            wander_goal: None,
            stunned: false,
            blend_x: 0.0,
            blend_z: 0.0,
            yaw: 0.0,
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn target(&self) -> Option<ParticipantId> {
        self.targeting.current()
    }

    pub fn possession(&self) -> &PossessionManager {
        &self.possession
    }

    pub fn aggression_level(&self) -> f32 {
        self.aggression.level()
    }

    // -----------------------------------------------------------------
    // Per-frame cadence
    // -----------------------------------------------------------------

    pub fn update(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        if frame.stun_active {
            io.presentation.set_animation_flag("stunned", true);
            self.enter_stun(frame, session, io);
            return;
        }
        if self.stunned {
            io.presentation.set_animation_flag("stunned", false);
            self.stunned = false;
        }

        self.face_target(frame, session, io);
        self.blend_motion(frame, session, io);
        io.presentation
            .set_blend_value("anger_level", self.aggression.level());
        io.presentation.set_light_interpolation(self.aggression.level());
        io.presentation
            .set_animation_flag("lamp_on", !self.possession.is_holding());
        self.refresh_interact_prompt(session, io);
        self.mirror_capture_anchor(frame, session);
        self.targeting.tick_cooldown(frame.dt);

        let drive = match self.state {
            BehaviorState::Escalating => Drive::Rise,
            BehaviorState::Chasing => Drive::Hold,
            _ => Drive::Decay,
        };
        if self.aggression.update(frame.dt, drive) {
            if let Some(target) = self.targeting.current() {
                session.force_fear(target, 1.0);
            }
            self.switch_state(BehaviorState::Chasing, io.replication);
        }

        let carry = self.possession.carry_speed_multiplier();
        let speed = match self.state {
            BehaviorState::Searching | BehaviorState::OpeningPassage => SEARCH_SPEED * carry,
            BehaviorState::Following => FOLLOW_SPEED * carry,
            // Rage ignores the carry penalty.
            BehaviorState::Chasing => CHASE_SPEED,
            BehaviorState::Escalating | BehaviorState::Capturing => 0.0,
        };
        io.nav.set_speed(speed);

        if let Some(mut capture) = self.capture.take() {
            match capture.poll(frame.dt, session, io.presentation, io.replication) {
                CaptureStatus::Running => self.capture = Some(capture),
                CaptureStatus::Finished { remains } => {
                    if let Some(remains) = remains {
                        self.possession
                            .grab_item(remains, frame.position, session, io.replication);
                    }
                    self.wander_goal = None;
                    self.switch_state(BehaviorState::Searching, io.replication);
                }
            }
        } else if self.state == BehaviorState::Capturing {
            // The victim slipped the anchor (cancelled sequence).
            self.switch_state(BehaviorState::Chasing, io.replication);
        }
    }

    fn enter_stun(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        io.nav.set_speed(0.0);
        if self.stunned {
            return;
        }
        debug!("stun received");
        self.stunned = true;
        if let Some(mut capture) = self.capture.take() {
            capture.cancel(session, io.replication);
        }
        if self.possession.is_holding() {
            self.possession
                .drop_held(frame.position, session, io.replication);
        }
    }

    /// Turn toward the target while following or staring, exponential
    /// with factor 10 x dt.
    fn face_target(&mut self, frame: &Frame, session: &Session, io: &mut AgentIo<'_>) {
        if !matches!(
            self.state,
            BehaviorState::Following | BehaviorState::Escalating
        ) {
            return;
        }
        let Some(target_pos) = self.target_position(session) else {
            return;
        };
        let goal = yaw_toward(frame.position.x, frame.position.z, target_pos.x, target_pos.z);
        self.yaw = exp_lerp(self.yaw, goal, 10.0, frame.dt);
        io.presentation.set_blend_value("facing_yaw", self.yaw);
    }

    /// Animation blend values: chase angle toward the target and the
    /// smoothed local velocity, with a small deadzone.
    fn blend_motion(&mut self, frame: &Frame, session: &Session, io: &mut AgentIo<'_>) {
        if let Some(target_pos) = self.target_position(session) {
            let angle = signed_angle_xz(target_pos - frame.position, frame.facing) / 100.0;
            io.presentation.set_blend_value("chase_angle", angle);
        }

        let velocity = io.nav.current_velocity().clamp_magnitude(1.0);
        let forward = frame.facing.normalized();
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        self.blend_x = exp_lerp(self.blend_x, velocity.dot(right), 10.0, frame.dt);
        self.blend_z = exp_lerp(self.blend_z, velocity.dot(forward), 10.0, frame.dt);

        let mut average = (self.blend_x + self.blend_z) / 2.0;
        if average.abs() < 0.1 {
            average = 0.0;
        }
        io.presentation
            .set_blend_value("average_velocity", average.clamp(-2.0, 2.0));
    }

    /// The hand-over prompt is offered only while following a target
    /// whose held item the agent could actually accept.
    fn refresh_interact_prompt(&self, session: &Session, io: &mut AgentIo<'_>) {
        let enabled = self.state == BehaviorState::Following
            && !self.stunned
            && self
                .targeting
                .current()
                .and_then(|id| session.participant(id))
                .and_then(Participant::held_item)
                .map(|item| !item.two_handed || self.options.can_carry_two_handed)
                .unwrap_or(false);
        io.presentation.set_interact_prompt(enabled);
    }

    /// Keep the capture victim pinned to the agent-relative anchor,
    /// every frame for the duration of the sequence.
    fn mirror_capture_anchor(&self, frame: &Frame, session: &mut Session) {
        if let Some(capture) = &self.capture {
            if capture.holds_claim() {
                let anchor = frame.position + frame.facing.normalized() * ANCHOR_OFFSET;
                session.pin_to_anchor(capture.target(), anchor, frame.facing);
            }
        }
    }

    // -----------------------------------------------------------------
    // Decision cadence
    // -----------------------------------------------------------------

    pub fn decide(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let holding_comm = self.possession.holding_kind(ItemKind::Communication);
        self.comms
            .poll(self.targeting.current(), holding_comm, session);

        match self.state {
            BehaviorState::Searching => self.search_tick(frame, session, io),
            BehaviorState::Following => self.follow_tick(frame, session, io),
            BehaviorState::Chasing => self.chase_tick(frame, session, io),
            BehaviorState::Escalating => self.escalate_tick(frame, session, io),
            // Waiting on the capture sequence; update handles the exit.
            BehaviorState::Capturing => {}
            BehaviorState::OpeningPassage => self.passage_tick(frame, session, io),
        }
    }

    fn search_tick(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let acquired = self.targeting.find_closest_in_range(
            frame.position,
            session,
            io.spatial,
            SEARCH_RANGE,
            SENSE_RANGE,
        );
        match acquired {
            Some(acquired) => {
                debug!(target = acquired.id.0, "target acquired");
                if acquired.switched {
                    self.announce_target(acquired.id, io);
                }
                self.wander_goal = None;
                if self.target_has_item(session) || self.possession.is_holding() {
                    self.switch_state(BehaviorState::Following, io.replication);
                } else {
                    self.switch_state(BehaviorState::Escalating, io.replication);
                }
            }
            None => self.wander(frame, io),
        }
    }

    fn follow_tick(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let Some(target_pos) = self.revalidate_target(frame, session, io) else {
            return;
        };
        if !self.target_has_item(session) && !self.possession.is_holding() {
            self.switch_state(BehaviorState::Escalating, io.replication);
            return;
        }
        if !self.stunned {
            self.watch_gestures(frame, session, io);
            if self.state != BehaviorState::Following {
                return;
            }
        }

        let toward = (target_pos - frame.position).normalized();
        let goal = target_pos - Vec3::new(toward.x * FOLLOW_OFFSET, 0.0, toward.z * FOLLOW_OFFSET);
        if frame.position.distance(goal) > ARRIVE_RADIUS {
            io.nav.set_destination(goal, false);
        }
    }

    fn chase_tick(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let Some(target_pos) = self.revalidate_target(frame, session, io) else {
            return;
        };
        if self.target_has_item(session) {
            self.switch_state(BehaviorState::Following, io.replication);
            return;
        }
        io.nav.set_destination(target_pos, false);
    }

    fn escalate_tick(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        if self.revalidate_target(frame, session, io).is_none() {
            return;
        }
        if self.target_has_item(session) || self.possession.is_holding() {
            self.switch_state(BehaviorState::Following, io.replication);
        }
    }

    fn passage_tick(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let Some(passage_id) = self.pending_passage else {
            self.return_to_search(io);
            return;
        };
        let holding_key = self.possession.holding_kind(ItemKind::Key);
        let passage = session.passage(passage_id).map(|p| (p.position, p.locked));
        let Some((passage_pos, locked)) = passage else {
            self.pending_passage = None;
            self.return_to_search(io);
            return;
        };
        if !locked || !holding_key {
            self.pending_passage = None;
            self.return_to_search(io);
            return;
        }

        if frame.position.distance(passage_pos) < PASSAGE_REACH {
            // The key is spent, not dropped.
            self.possession.consume_held();
            session.unlock_passage(passage_id);
            io.replication.broadcast(&AgentEvent::PassageUnlocked {
                passage: passage_id,
            });
            io.presentation.play_cue("unlock");
            debug!(passage = passage_id, "passage unlocked");
            self.pending_passage = None;
            self.return_to_search(io);
        } else {
            // Walk to the near side of the passage.
            let toward = (passage_pos - frame.position).normalized();
            io.nav.set_destination(passage_pos - toward, false);
        }
    }

    // -----------------------------------------------------------------
    // External events
    // -----------------------------------------------------------------

    /// Physical contact with a participant. Starts a capture when
    /// chasing an empty-handed, unclaimed one.
    pub fn on_contact(
        &mut self,
        participant: ParticipantId,
        session: &mut Session,
        io: &mut AgentIo<'_>,
    ) {
        if self.state != BehaviorState::Chasing || self.capture.is_some() {
            return;
        }
        let Some(p) = session.participant(participant) else {
            return;
        };
        if !p.is_eligible() || p.in_special_interaction || self.participant_has_item(p) {
            return;
        }
        if let Some(sequence) =
            CaptureSequence::begin(self.id, participant, session, io.presentation, io.replication)
        {
            self.capture = Some(sequence);
            self.switch_state(BehaviorState::Capturing, io.replication);
        }
    }

    /// A participant triggered the hand-over prompt: take their held
    /// item.
    pub fn on_interact(
        &mut self,
        participant: ParticipantId,
        frame: &Frame,
        session: &mut Session,
        io: &mut AgentIo<'_>,
    ) {
        if self.state != BehaviorState::Following || self.stunned {
            return;
        }
        self.possession.grab_from(
            session,
            participant,
            frame.position,
            &self.options,
            io.presentation,
            io.replication,
        );
    }

    /// Being hit makes the agent use whatever it is holding.
    pub fn on_hit(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        self.use_held_item(frame, session, io);
    }

    // -----------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------

    /// Re-validate the current target for the active states: nearest
    /// participant wins (hysteresis permitting), and a target both out
    /// of range and occluded is abandoned. Distance gates run before
    /// any inventory check.
    fn revalidate_target(
        &mut self,
        frame: &Frame,
        session: &mut Session,
        io: &mut AgentIo<'_>,
    ) -> Option<Vec3> {
        let Some(acquired) = self
            .targeting
            .refresh_closest_unconditional(frame.position, session)
        else {
            self.lose_target(io);
            return None;
        };
        if acquired.switched {
            self.announce_target(acquired.id, io);
        }
        let target_pos = session.participant(acquired.id)?.position;
        if acquired.distance > FOLLOW_RANGE && !io.spatial.line_of_sight(frame.position, target_pos)
        {
            self.lose_target(io);
            return None;
        }
        Some(target_pos)
    }

    fn lose_target(&mut self, io: &mut AgentIo<'_>) {
        if self.targeting.current().is_some() {
            debug!("target lost");
            self.targeting.clear();
            io.replication
                .broadcast(&AgentEvent::TargetChanged { target: None });
        }
        self.gesture.reset();
        self.return_to_search(io);
    }

    fn return_to_search(&mut self, io: &mut AgentIo<'_>) {
        self.wander_goal = None;
        self.switch_state(BehaviorState::Searching, io.replication);
    }

    fn announce_target(&mut self, id: ParticipantId, io: &mut AgentIo<'_>) {
        io.replication
            .broadcast(&AgentEvent::TargetChanged { target: Some(id) });
        // The new target's owner becomes authoritative for this agent.
        if let Err(err) = io.replication.request_authority(id) {
            warn!(target = id.0, error = %err, "authority transfer rejected");
        }
    }

    fn switch_state(&mut self, next: BehaviorState, replication: &mut dyn Replication) {
        if self.state == next {
            return;
        }
        debug!(from = ?self.state, to = ?next, "state change");
        self.state = next;
        replication.broadcast(&AgentEvent::StateChanged { state: next.code() });
    }

    fn wander(&mut self, frame: &Frame, io: &mut AgentIo<'_>) {
        let arrived = self
            .wander_goal
            .map(|goal| frame.position.distance(goal) < ARRIVE_RADIUS)
            .unwrap_or(true);
        if arrived {
            let mut rng = rand::thread_rng();
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let radius = rng.gen_range(0.0..WANDER_RADIUS);
            self.wander_goal = Some(
                frame.position + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius),
            );
        }
        if let Some(goal) = self.wander_goal {
            io.nav.set_destination(goal, true);
        }
    }

    fn watch_gestures(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        if !self.options.gesture_commands {
            return;
        }
        let Some(target) = self.targeting.current() else {
            return;
        };
        let Some(p) = session.participant(target) else {
            return;
        };
        let pointing = p.gesture == Some(Gesture::Point);
        let gaze = io.spatial.gaze_target(target);
        let holds_key = self.possession.holding_kind(ItemKind::Key);
        let Some(command) = self
            .gesture
            .observe(frame.dt, target, pointing, gaze, holds_key)
        else {
            return;
        };

        match command {
            GestureCommand::DropItem => {
                if self.possession.is_holding() {
                    io.presentation.set_animation_trigger("start_drop");
                    self.possession
                        .drop_held(frame.position, session, io.replication);
                }
            }
            GestureCommand::UseItem => self.use_held_item(frame, session, io),
            GestureCommand::Retarget(id) => {
                if self.targeting.try_retarget(id) {
                    self.announce_target(id, io);
                }
            }
            GestureCommand::UnlockPassage(id) => {
                self.pending_passage = Some(id);
                self.switch_state(BehaviorState::OpeningPassage, io.replication);
            }
        }
    }

    fn use_held_item(&mut self, frame: &Frame, session: &mut Session, io: &mut AgentIo<'_>) {
        let outcome = self.possession.use_held(
            frame.position,
            session,
            io.spatial,
            io.presentation,
            io.replication,
        );
        match outcome {
            UseOutcome::Nothing => {}
            UseOutcome::OpenPassage(id) => {
                self.pending_passage = Some(id);
                self.switch_state(BehaviorState::OpeningPassage, io.replication);
            }
            UseOutcome::ToggleComm => {
                if self.comms.is_active() {
                    self.comms.stop(session);
                } else {
                    let powered = self
                        .possession
                        .held()
                        .map(|item| item.powered_on)
                        .unwrap_or(false);
                    self.comms.start(powered, self.targeting.current());
                }
            }
        }
    }

    fn target_position(&self, session: &Session) -> Option<Vec3> {
        self.targeting
            .current()
            .and_then(|id| session.participant(id))
            .map(|p| p.position)
    }

    /// Whether the current target "has an item" for transition purposes.
    fn target_has_item(&self, session: &Session) -> bool {
        self.targeting
            .current()
            .and_then(|id| session.participant(id))
            .map(|p| self.participant_has_item(p))
            .unwrap_or(false)
    }

    fn participant_has_item(&self, p: &Participant) -> bool {
        if self.options.can_kill_empty_handed {
            p.held_item().is_some()
        } else {
            p.has_any_item()
        }
    }
}
