//! Items the agent can carry. Capability dispatch happens in the
//! possession manager; this module only models the item itself.

use thiserror::Error;

use crate::math::Vec3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    /// The item's activation path assumes a player is operating it.
    #[error("item `{0}` can only be operated by a player")]
    PlayerOperated(String),
}

/// Capability tag deciding how `use` dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Detonates when used, then is discarded.
    Explosive,
    /// Makes noise in place; stays held.
    Noisemaker,
    /// Player-deployed tool; activation may be rejected for a non-player.
    Extendable,
    /// Armed by pulling a pin, then discarded.
    IncendiaryPin,
    /// Opens locked passages.
    Key,
    /// Surface-marking tool (use is deferred at this layer).
    Marking,
    /// Two-way voice link.
    Communication,
    /// Ranged weapon that reloads itself when used with rounds loaded.
    RangedReload,
    /// No special capability.
    Generic,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    /// Carry weight. 1.0 carries with no speed penalty.
    pub weight: f32,
    pub two_handed: bool,
    /// Powered on (communication items).
    pub powered_on: bool,
    /// Pin armed (incendiary items).
    pub pin_armed: bool,
    /// Rounds currently loaded (ranged items).
    pub rounds_loaded: u32,
    /// Generic activation is rejected for non-players.
    pub player_operated: bool,
    /// Held at the agent's carry point, physics disabled.
    pub enemy_held: bool,
    /// Where the item came to rest when last dropped.
    pub rest_position: Option<Vec3>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            weight: 1.0,
            two_handed: false,
            powered_on: false,
            pin_armed: false,
            rounds_loaded: 0,
            player_operated: false,
            enemy_held: false,
            rest_position: None,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn two_handed(mut self) -> Self {
        self.two_handed = true;
        self
    }

    /// Generic client-side activation, as a player-held item would do it.
    pub fn use_generic(&mut self) -> Result<(), ItemError> {
        if self.player_operated {
            return Err(ItemError::PlayerOperated(self.name.clone()));
        }
        Ok(())
    }

    /// The grabbable remains left behind by a finalized capture.
    pub fn remains(of: &str) -> Self {
        Item::new(format!("remains of {of}"), ItemKind::Generic).with_weight(1.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_use_rejected_for_player_operated_items() {
        let mut ladder = Item::new("ladder", ItemKind::Extendable);
        ladder.player_operated = true;
        assert_eq!(
            ladder.use_generic(),
            Err(ItemError::PlayerOperated("ladder".into()))
        );
    }

    #[test]
    fn generic_use_succeeds_otherwise() {
        let mut horn = Item::new("horn", ItemKind::Noisemaker);
        assert!(horn.use_generic().is_ok());
    }
}
