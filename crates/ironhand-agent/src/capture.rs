//! Capture sequence: the timed, interruptible routine that crushes a
//! captured participant.
//!
//! Modeled as a resumable phase machine polled with simulated time on
//! the agent's single logical thread. Every wait is a phase boundary,
//! and cancellation is honored at each of them.

use tracing::debug;

use ironhand_sync::{AgentEvent, ParticipantId};

use crate::hooks::{Presentation, Replication};
use crate::item::Item;
use crate::session::{AgentId, CaptureClaim, Session};

/// Damage applied per crush step.
pub const CRUSH_DAMAGE: i32 = 20;

/// Simulated seconds between crush steps.
pub const CRUSH_INTERVAL_SECS: f32 = 0.5;

/// Total crush-loop budget in simulated seconds.
pub const CRUSH_BUDGET_SECS: f32 = 2.0;

/// Settle delay after the kill before the anchor releases.
pub const SETTLE_DELAY_SECS: f32 = 0.8;

#[derive(Debug)]
pub enum CaptureStatus {
    Running,
    /// Sequence over. `remains` carries the victim's grabbable remains
    /// when the capture finalized and the victim left any.
    Finished { remains: Option<Item> },
}

#[derive(Debug)]
enum Phase {
    /// Timed damage loop. `budget` is the unspent loop budget,
    /// `until_next` the wait before the next step.
    Crush { budget: f32, until_next: f32 },
    /// Waiting out leftover budget after the final blow.
    Drain { remaining: f32 },
    /// Post-kill settle before the anchor releases.
    Settle { remaining: f32 },
    Done,
}

#[derive(Debug)]
pub struct CaptureSequence {
    agent: AgentId,
    target: ParticipantId,
    /// The interaction lock. Taken (and released) at most once, on
    /// finalize or cancel, whichever comes first.
    claim: Option<CaptureClaim>,
    phase: Phase,
    remains: Option<Item>,
}

impl CaptureSequence {
    /// Acquire the interaction lock and start the sequence. Declines
    /// (returns None) when another agent already holds the lock.
    pub fn begin(
        agent: AgentId,
        target: ParticipantId,
        session: &mut Session,
        presentation: &mut dyn Presentation,
        replication: &mut dyn Replication,
    ) -> Option<Self> {
        let claim = session.try_begin_capture(agent, target)?;
        debug!(target = target.0, "capture sequence started");
        replication.broadcast(&AgentEvent::CaptureStarted { target });
        presentation.set_animation_trigger("start_kill");
        presentation.play_cue("crush");
        Some(Self {
            agent,
            target,
            claim: Some(claim),
            phase: Phase::Crush {
                budget: CRUSH_BUDGET_SECS,
                until_next: 0.0,
            },
            remains: None,
        })
    }

    pub fn target(&self) -> ParticipantId {
        self.target
    }

    /// Whether the victim is still anchored to the agent.
    pub fn holds_claim(&self) -> bool {
        self.claim.is_some()
    }

    /// Advance by `dt` simulated seconds.
    pub fn poll(
        &mut self,
        dt: f32,
        session: &mut Session,
        presentation: &mut dyn Presentation,
        replication: &mut dyn Replication,
    ) -> CaptureStatus {
        let mut dt = dt;
        loop {
            match &mut self.phase {
                Phase::Crush { budget, until_next } => {
                    if *until_next > dt {
                        *until_next -= dt;
                        return CaptureStatus::Running;
                    }
                    dt -= *until_next;
                    *until_next = 0.0;

                    let health = session
                        .participant(self.target)
                        .map(|p| p.health)
                        .unwrap_or(0);
                    if health > CRUSH_DAMAGE && *budget > 0.0 {
                        session.damage(self.target, CRUSH_DAMAGE);
                        *budget -= CRUSH_INTERVAL_SECS;
                        *until_next = CRUSH_INTERVAL_SECS;
                    } else {
                        // Final blow: leave exactly 1 health, then wait
                        // out whatever budget the loop did not spend.
                        session.damage(self.target, (health - 1).max(0));
                        self.phase = Phase::Drain {
                            remaining: budget.max(0.0),
                        };
                    }
                }
                Phase::Drain { remaining } => {
                    if *remaining > dt {
                        *remaining -= dt;
                        return CaptureStatus::Running;
                    }
                    dt -= *remaining;
                    self.finalize(session, replication);
                }
                Phase::Settle { remaining } => {
                    if *remaining > dt {
                        *remaining -= dt;
                        return CaptureStatus::Running;
                    }
                    presentation.set_animation_trigger("start_pickup");
                    self.phase = Phase::Done;
                    return CaptureStatus::Finished {
                        remains: self.remains.take(),
                    };
                }
                Phase::Done => {
                    return CaptureStatus::Finished {
                        remains: self.remains.take(),
                    }
                }
            }
        }
    }

    /// Deliver the kill if the victim is still linked to this agent and
    /// alive; otherwise just release the lock.
    fn finalize(&mut self, session: &mut Session, replication: &mut dyn Replication) {
        let still_linked = session
            .participant(self.target)
            .map(|p| p.captured_by == Some(self.agent) && !p.dead)
            .unwrap_or(false);
        if let Some(claim) = self.claim.take() {
            session.release_capture(claim);
        }
        if still_linked {
            self.remains = session.deliver_kill(self.target);
            replication.broadcast(&AgentEvent::CaptureReleased {
                target: self.target,
                finalized: true,
            });
            self.phase = Phase::Settle {
                remaining: SETTLE_DELAY_SECS,
            };
        } else {
            debug!(target = self.target.0, "capture ended without a kill");
            replication.broadcast(&AgentEvent::CaptureReleased {
                target: self.target,
                finalized: false,
            });
            self.phase = Phase::Settle { remaining: 0.0 };
        }
    }

    /// Halt immediately (stun): release the lock without finalizing so
    /// the victim survives. Safe to call at any point, any number of
    /// times — the lock is only ever released once.
    pub fn cancel(&mut self, session: &mut Session, replication: &mut dyn Replication) {
        if let Some(claim) = self.claim.take() {
            debug!(target = self.target.0, "capture sequence cancelled");
            session.release_capture(claim);
            replication.broadcast(&AgentEvent::CaptureReleased {
                target: self.target,
                finalized: false,
            });
        }
        self.phase = Phase::Done;
    }
}
