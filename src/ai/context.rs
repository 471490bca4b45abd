//! Planning context builder
//!
//! Derives the intent, threat map, energy reserve, roles, opening and
//! endgame state once per decision cycle. Every later stage reads the
//! resulting `PlanningContext` and never changes it.

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::core::types::{PlayerId, Position, UnitType};
use crate::game::board::MineType;
use crate::game::constants::{GRID_COLS, GRID_ROWS};
use crate::game::rules::general_attack_range;
use crate::game::state::GameState;

use super::difficulty::Difficulty;
use super::endgame::evaluate_endgame;
use super::opening::choose_opening_plan;
use super::roles::assign_roles;
use super::tuning::TuningProfile;
use super::types::{
    HotspotCell, Intent, OpeningPlan, OpeningState, OpponentModel, PlanningContext, ThreatMap, IMPASSABLE_RISK,
};

const HOTSPOT_LIMIT: usize = 8;

/// Pick the side-wide goal; the first rule that matches wins
pub fn derive_intent(state: &GameState, ai_player: PlayerId, model: &OpponentModel) -> Intent {
    let enemy = ai_player.opponent();
    let own = state.player(ai_player);

    if state.any_flag_carrier(enemy).is_some() {
        return Intent::HuntFlagCarrier;
    }
    if state.any_flag_carrier(ai_player).is_some() {
        return Intent::PushFlag;
    }

    let mines_nearby = state
        .mines_of(enemy)
        .any(|m| own.living_units().any(|u| u.pos.manhattan(&m.pos) <= 2));
    if mines_nearby || model.mine_pressure >= 4.5 {
        return Intent::ControlMines;
    }

    let fragile = own
        .living_units()
        .filter(|u| u.max_hp > 0 && u.hp_ratio_or(1.0) <= 0.45)
        .count();
    if fragile >= 2 || own.energy <= 12 || model.aggression >= 5.5 {
        return Intent::Stabilize;
    }

    if model.flag_rush >= 5.2 {
        return Intent::HuntFlagCarrier;
    }

    Intent::PushFlag
}

/// Per-cell danger for `ai_player`'s units
///
/// Obstacles stay at exactly `IMPASSABLE_RISK`; the difficulty scale only
/// touches passable cells.
pub fn build_threat_map(state: &GameState, ai_player: PlayerId, difficulty: Difficulty) -> ThreatMap {
    let enemy = ai_player.opponent();
    let enemy_units: Vec<_> = state.player(enemy).living_units().collect();
    let scale = difficulty.risk_scale();

    (0..GRID_ROWS)
        .map(|r| {
            (0..GRID_COLS)
                .map(|c| {
                    let pos = Position::new(r, c);
                    if state.is_obstacle(pos) {
                        return IMPASSABLE_RISK;
                    }

                    let mut risk = 0.0;
                    if state.mines_of(enemy).any(|m| m.pos == pos) {
                        risk += 90.0;
                    }
                    if state
                        .mines_of(enemy)
                        .any(|m| m.kind == MineType::Nuke && m.pos.chebyshev(&pos) <= 1)
                    {
                        risk += 65.0;
                    }

                    for unit in &enemy_units {
                        let dist = unit.pos.manhattan(&pos);
                        if dist <= 1 {
                            risk += 9.0;
                        } else if dist == 2 {
                            risk += 4.0;
                        }
                        if unit.kind() == UnitType::General
                            && unit.pos.is_cardinal_to(&pos)
                            && dist <= general_attack_range(state, unit)
                        {
                            risk += 16.0;
                        }
                    }

                    risk * scale
                })
                .collect()
        })
        .collect()
}

/// Energy the side tries to keep unspent this turn
pub fn calculate_reserve_energy(state: &GameState, intent: Intent, difficulty: Difficulty, ai_player: PlayerId) -> i32 {
    let energy = state.player(ai_player).energy;
    let bonus = match intent {
        Intent::HuntFlagCarrier | Intent::Stabilize => 2,
        Intent::PushFlag | Intent::ControlMines => 1,
    };
    let pool_cap = ((energy as f32 * 0.55).floor() as i32).max(0);
    (difficulty.reserve_base() + bonus).min(pool_cap)
}

/// Strongest hotspots first, at most eight
pub fn top_hotspots(model: &OpponentModel) -> Vec<HotspotCell> {
    let mut cells: Vec<HotspotCell> = model
        .hotspots
        .iter()
        .map(|(pos, weight)| HotspotCell { pos: *pos, weight: *weight })
        .collect();
    cells.sort_by_key(|cell| (std::cmp::Reverse(OrderedFloat(cell.weight)), cell.pos));
    cells.truncate(HOTSPOT_LIMIT);
    cells
}

pub fn build_planning_context(
    state: &GameState,
    difficulty: Difficulty,
    ai_player: PlayerId,
    model: &OpponentModel,
    opening_plan: Option<OpeningPlan>,
    profile: TuningProfile,
) -> PlanningContext {
    let endgame = evaluate_endgame(state, ai_player);
    let intent = derive_intent(state, ai_player, model);
    let threat_map = build_threat_map(state, ai_player, difficulty);
    let reserve_energy = calculate_reserve_energy(state, intent, difficulty, ai_player);
    let unit_roles = assign_roles(state, ai_player, intent, model);
    let plan = opening_plan.unwrap_or_else(|| choose_opening_plan(state, difficulty, profile, model, ai_player));

    let carrier = state.any_flag_carrier(ai_player).is_some() || state.any_flag_carrier(ai_player.opponent()).is_some();
    let is_opening = !endgame.is_endgame && !carrier && state.turn_count <= 6;
    let weight = if is_opening {
        ((7.0 - state.turn_count as f32) / 6.0).max(0.22)
    } else {
        0.0
    };

    debug!(
        player = %ai_player,
        intent = %intent,
        reserve = reserve_energy,
        endgame = %endgame.mode,
        opening = is_opening,
        "planning context built"
    );

    PlanningContext {
        intent,
        threat_map,
        reserve_energy,
        unit_roles,
        opponent_model: model.clone(),
        hotspot_cells: top_hotspots(model),
        opening: OpeningState {
            is_opening,
            plan: is_opening.then_some(plan),
            weight,
            turn: state.turn_count,
        },
        endgame,
    }
}
