//! Opponent model - a decaying tracker of how the enemy plays
//!
//! The model is a value: `update` takes the previous model and returns a new
//! one. Callers carry it from turn to turn.

use ahash::AHashMap;

use crate::core::types::PlayerId;
use crate::game::state::GameState;

use super::types::OpponentModel;

const TRACKER_DECAY: f32 = 0.8;
const HOTSPOT_DECAY: f32 = 0.86;
const HOTSPOT_FLOOR: f32 = 0.35;
const HOTSPOT_CAP: f32 = 12.0;
const TRACKER_CAP: f32 = 10.0;

impl OpponentModel {
    /// Empty model with no observations
    pub fn initial() -> Self {
        Self::default()
    }
}

/// Fold one observed transition into the model
///
/// Returns `prev` unchanged when there is no earlier snapshot to compare.
pub fn update(
    prev: &OpponentModel,
    prev_state: Option<&GameState>,
    next_state: &GameState,
    ai_player: PlayerId,
) -> OpponentModel {
    let Some(prev_state) = prev_state else {
        return prev.clone();
    };

    let enemy = ai_player.opponent();
    let ai_flag = next_state.player(ai_player).flag_position;

    let mut toward_flag = 0u32;
    for next_unit in next_state.player(enemy).living_units() {
        let Some(prev_unit) = prev_state.player(enemy).living_units().find(|u| u.id == next_unit.id) else {
            continue;
        };
        if next_unit.pos.manhattan(&ai_flag) < prev_unit.pos.manhattan(&ai_flag) {
            toward_flag += 1;
        }
    }

    let enemy_carrier = next_state.player(enemy).living_units().any(|u| u.has_flag);
    let prev_mines = prev_state.mines_of(enemy).count() as i32;
    let next_mines = next_state.mines_of(enemy).count() as i32;
    let mine_delta = (next_mines - prev_mines).max(0);

    let mut hp_loss = 0;
    let mut deaths = 0;
    for next_unit in &next_state.player(ai_player).units {
        let Some(prev_unit) = prev_state.player(ai_player).units.iter().find(|u| u.id == next_unit.id) else {
            continue;
        };
        hp_loss += (prev_unit.hp - next_unit.hp).max(0);
        if !prev_unit.is_dead && next_unit.is_dead {
            deaths += 1;
        }
    }

    let aggression_gain = hp_loss as f32 * 0.08 + deaths as f32 * 1.5;
    let flag_rush_gain = toward_flag as f32 * 0.9 + if enemy_carrier { 1.7 } else { 0.0 };
    let mine_gain = mine_delta as f32 * 1.4;

    let mut hotspots: AHashMap<_, f32> = prev
        .hotspots
        .iter()
        .map(|(pos, weight)| (*pos, weight * HOTSPOT_DECAY))
        .filter(|(_, weight)| *weight >= HOTSPOT_FLOOR)
        .collect();
    for unit in next_state.player(enemy).living_units() {
        let gain = if unit.has_flag { 2.4 } else { 1.2 };
        let entry = hotspots.entry(unit.pos).or_insert(0.0);
        *entry = (*entry + gain).clamp(0.0, HOTSPOT_CAP);
    }

    OpponentModel {
        aggression: (prev.aggression * TRACKER_DECAY + aggression_gain).clamp(0.0, TRACKER_CAP),
        flag_rush: (prev.flag_rush * TRACKER_DECAY + flag_rush_gain).clamp(0.0, TRACKER_CAP),
        mine_pressure: (prev.mine_pressure * TRACKER_DECAY + mine_gain).clamp(0.0, TRACKER_CAP),
        hotspots,
        samples: prev.samples + 1,
    }
}
