//! Construction-time options for one agent. Read-only after spawn.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentOptions {
    /// Spawn chance weight relative to other agent kinds.
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: u32,
    /// When true, only the currently-held item counts as "has an item",
    /// so participants with stowed items are still fair game.
    #[serde(default)]
    pub can_kill_empty_handed: bool,
    /// Allow carrying two-handed items.
    #[serde(default = "default_true")]
    pub can_carry_two_handed: bool,
    /// Enable gesture-driven commands from participants.
    #[serde(default = "default_true")]
    pub gesture_commands: bool,
}

fn default_spawn_weight() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            spawn_weight: default_spawn_weight(),
            can_kill_empty_handed: false,
            can_carry_two_handed: true,
            gesture_commands: true,
        }
    }
}
