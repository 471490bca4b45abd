//! Tactical role assignment and formation scoring

use ahash::AHashMap;

use crate::core::types::{PlayerId, UnitId, UnitType};
use crate::game::constants::unit_stats;
use crate::game::state::GameState;
use crate::game::units::Unit;

use super::types::{Intent, OpponentModel, Role};

fn default_role(kind: UnitType) -> Role {
    match kind {
        UnitType::General => Role::Striker,
        UnitType::Ranger => Role::Flanker,
        UnitType::Maker => Role::Controller,
        UnitType::Minesweeper => Role::Scout,
        UnitType::Defuser => Role::Support,
    }
}

/// Role for every living unit of `ai_player`; dead units get no entry
pub fn assign_roles(
    state: &GameState,
    ai_player: PlayerId,
    intent: Intent,
    model: &OpponentModel,
) -> AHashMap<UnitId, Role> {
    state
        .player(ai_player)
        .living_units()
        .map(|unit| {
            let role = match (intent, unit.kind()) {
                (Intent::HuntFlagCarrier, UnitType::Ranger) => Role::Striker,
                (Intent::Stabilize, UnitType::General) if model.aggression > 3.5 => Role::Support,
                (_, kind) => default_role(kind),
            };
            (unit.id, role)
        })
        .collect()
}

/// Orthogonal neighbours a unit could step onto right now
pub fn free_neighbors(state: &GameState, unit: &Unit) -> usize {
    unit.pos
        .neighbors()
        .iter()
        .filter(|pos| state.can_occupy(**pos))
        .count()
}

fn intent_role_bonus(intent: Intent, role: Role) -> f32 {
    match intent {
        Intent::PushFlag => match role {
            Role::Striker | Role::Flanker => 1.4,
            _ => -0.2,
        },
        Intent::HuntFlagCarrier => match role {
            Role::Striker => 1.8,
            Role::Flanker => 1.0,
            _ => 0.0,
        },
        Intent::ControlMines => match role {
            Role::Controller | Role::Scout | Role::Support => 1.3,
            _ => -0.4,
        },
        Intent::Stabilize => match role {
            Role::Support => 1.6,
            Role::Striker => -0.8,
            _ => 0.3,
        },
    }
}

/// Positional bonus for a unit playing `role` under `intent`
pub fn formation_bonus(state: &GameState, unit: &Unit, role: Role, intent: Intent, ai_player: PlayerId) -> f32 {
    let own_flag = state.player(ai_player).flag_position;
    let enemy_flag = state.player(ai_player.opponent()).flag_position;
    let dist_enemy = unit.pos.manhattan(&enemy_flag);
    let dist_own = unit.pos.manhattan(&own_flag);
    let mobility = free_neighbors(state, unit) as f32;

    let mut bonus = match role {
        Role::Striker => {
            let mut b = (9 - dist_enemy).max(0) as f32 * 0.7 + (dist_own - dist_enemy) as f32 * 0.25;
            if unit.has_flag {
                b += 4.0;
            }
            b
        }
        Role::Flanker => (8 - dist_enemy).max(0) as f32 * 0.45 + mobility * 0.65,
        Role::Controller => {
            let center_col = (enemy_flag.c + own_flag.c) as f32 / 2.0;
            (6.0 - (unit.pos.c as f32 - center_col).abs()).max(0.0) * 0.6 + mobility * 0.35
        }
        Role::Scout => mobility * 0.8 + (10 - dist_enemy).max(0) as f32 * 0.3,
        Role::Support => {
            (8 - dist_own).max(0) as f32 * 0.75 + (7 - unit_stats(unit.kind()).move_cost).max(0) as f32 * 0.3
        }
    };

    bonus += intent_role_bonus(intent, role);
    bonus
}
