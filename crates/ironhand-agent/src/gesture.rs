//! Gesture commands: the targeted participant can direct the agent by
//! holding the point gesture while looking at something.
//!
//! The watch is edge-triggered: one command per gesture, re-armed when
//! the gesture is released or held past the re-arm window.

use tracing::debug;

use ironhand_sync::ParticipantId;

use crate::hooks::GazeTarget;

/// Minimum hold before a pointed gesture counts.
pub const GESTURE_HOLD_SECS: f32 = 0.03;

/// Holding past this re-arms the watch for a second command.
pub const GESTURE_REARM_SECS: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureCommand {
    /// Pointing at the ground: drop the held item.
    DropItem,
    /// Pointing at the agent: use the held item.
    UseItem,
    /// Pointing at another participant: target them instead.
    Retarget(ParticipantId),
    /// Pointing at a locked passage while the agent carries a key.
    UnlockPassage(u64),
}

#[derive(Debug, Default)]
pub struct GestureWatch {
    held_for: f32,
    acted: bool,
}

impl GestureWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.held_for = 0.0;
        self.acted = false;
    }

    /// Advance the watch by `dt`. `pointing` is whether the watched
    /// participant is performing the point gesture, `gaze` what they
    /// are looking at, `holds_key` whether the agent carries a
    /// key-capable item. Returns at most one command per gesture.
    pub fn observe(
        &mut self,
        dt: f32,
        watcher: ParticipantId,
        pointing: bool,
        gaze: Option<GazeTarget>,
        holds_key: bool,
    ) -> Option<GestureCommand> {
        if !pointing {
            self.reset();
            return None;
        }
        self.held_for += dt;

        let mut command = None;
        if self.held_for > GESTURE_HOLD_SECS && !self.acted {
            command = match gaze {
                Some(GazeTarget::Ground) => Some(GestureCommand::DropItem),
                Some(GazeTarget::Agent) => Some(GestureCommand::UseItem),
                // Pointing at yourself is not a command.
                Some(GazeTarget::Participant(id)) if id != watcher => {
                    Some(GestureCommand::Retarget(id))
                }
                Some(GazeTarget::Passage(id)) if holds_key => {
                    Some(GestureCommand::UnlockPassage(id))
                }
                _ => None,
            };
            if command.is_some() {
                debug!(watcher = watcher.0, ?command, "gesture command issued");
                self.acted = true;
            }
        }

        // Still pointing well past the action: arm for another one.
        if self.acted && self.held_for > GESTURE_REARM_SECS {
            self.reset();
        }

        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCHER: ParticipantId = ParticipantId(1);
    const OTHER: ParticipantId = ParticipantId(2);

    fn hold(watch: &mut GestureWatch, gaze: GazeTarget, ticks: u32) -> Vec<GestureCommand> {
        let mut fired = Vec::new();
        for _ in 0..ticks {
            if let Some(cmd) = watch.observe(0.02, WATCHER, true, Some(gaze), false) {
                fired.push(cmd);
            }
        }
        fired
    }

    #[test]
    fn fires_once_after_the_hold_threshold() {
        let mut watch = GestureWatch::new();
        let fired = hold(&mut watch, GazeTarget::Ground, 4);
        assert_eq!(fired, vec![GestureCommand::DropItem]);
    }

    #[test]
    fn sub_threshold_taps_do_nothing() {
        let mut watch = GestureWatch::new();
        assert!(watch
            .observe(0.02, WATCHER, true, Some(GazeTarget::Ground), false)
            .is_none());
        // Released before the threshold.
        watch.observe(0.02, WATCHER, false, None, false);
        assert!(watch
            .observe(0.02, WATCHER, true, Some(GazeTarget::Ground), false)
            .is_none());
    }

    #[test]
    fn sustained_hold_rearms_past_the_window() {
        let mut watch = GestureWatch::new();
        // 20 ticks of 0.02 s is 0.4 s of pointing: enough for several
        // re-armed commands, but far fewer than one per tick.
        let fired = hold(&mut watch, GazeTarget::Agent, 20);
        assert!(fired.len() > 1);
        assert!(fired.len() < 5);
        assert!(fired.iter().all(|c| *c == GestureCommand::UseItem));
    }

    #[test]
    fn release_rearms_for_a_second_gesture() {
        let mut watch = GestureWatch::new();
        assert_eq!(hold(&mut watch, GazeTarget::Ground, 2), vec![GestureCommand::DropItem]);
        watch.observe(0.02, WATCHER, false, None, false);
        assert_eq!(hold(&mut watch, GazeTarget::Ground, 2), vec![GestureCommand::DropItem]);
    }

    #[test]
    fn pointing_at_yourself_is_ignored() {
        let mut watch = GestureWatch::new();
        let fired = hold(&mut watch, GazeTarget::Participant(WATCHER), 10);
        assert!(fired.is_empty());
    }

    #[test]
    fn retarget_points_at_the_other_participant() {
        let mut watch = GestureWatch::new();
        let fired = hold(&mut watch, GazeTarget::Participant(OTHER), 2);
        assert_eq!(fired, vec![GestureCommand::Retarget(OTHER)]);
    }

    #[test]
    fn passage_command_requires_a_key() {
        let mut watch = GestureWatch::new();
        for _ in 0..5 {
            assert!(watch
                .observe(0.02, WATCHER, true, Some(GazeTarget::Passage(7)), false)
                .is_none());
        }
        // Gaze never consumed the gesture, so a key arriving mid-hold
        // lets the command fire immediately.
        let cmd = watch.observe(0.02, WATCHER, true, Some(GazeTarget::Passage(7)), true);
        assert_eq!(cmd, Some(GestureCommand::UnlockPassage(7)));
    }
}
