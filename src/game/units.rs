//! Units on the board

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, Position, UnitId, UnitType};

use super::board::Mine;
use super::constants::{unit_stats, INITIAL_ENERGY};

/// Temporary modifiers applied by mines and skills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Extra energy each move costs while debuffed
    #[serde(default)]
    pub move_cost_debuff: i32,
    #[serde(default)]
    pub is_stealthed: bool,
    #[serde(default)]
    pub mine_vulnerability: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub pos: Position,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub energy_used_this_turn: i32,
    /// Energy pool at the start of the current action, basis of the per-turn cap
    pub start_of_action_energy: i32,
    #[serde(default)]
    pub has_acted_this_round: bool,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub respawn_timer: u32,
    #[serde(default)]
    pub has_flag: bool,
    #[serde(default)]
    pub carried_mine: Option<Mine>,
    #[serde(default)]
    pub status: UnitStatus,
}

impl Unit {
    pub fn new(owner: PlayerId, kind: UnitType, pos: Position) -> Self {
        let max_hp = unit_stats(kind).max_hp;
        Self {
            id: UnitId::new(owner, kind),
            pos,
            hp: max_hp,
            max_hp,
            energy_used_this_turn: 0,
            start_of_action_energy: INITIAL_ENERGY,
            has_acted_this_round: false,
            is_dead: false,
            respawn_timer: 0,
            has_flag: false,
            carried_mine: None,
            status: UnitStatus::default(),
        }
    }

    pub fn kind(&self) -> UnitType {
        self.id.kind
    }

    pub fn owner(&self) -> PlayerId {
        self.id.owner
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Alive and not yet acted this round
    pub fn is_idle(&self) -> bool {
        !self.is_dead && !self.has_acted_this_round
    }

    /// hp / max_hp, or `empty` for a unit with no hp pool
    pub fn hp_ratio_or(&self, empty: f32) -> f32 {
        if self.max_hp > 0 {
            self.hp as f32 / self.max_hp as f32
        } else {
            empty
        }
    }

    /// Apply damage; returns true if the unit died from it
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 && !self.is_dead {
            self.is_dead = true;
            return true;
        }
        false
    }
}
