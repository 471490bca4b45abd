//! Scoring for units and candidate actions
//!
//! Every score is a pure function of the state, the unit and the planning
//! context. Randomness never enters here; jitter is added by the generator.
//!
//! Action totals fold five weighted terms (attack, flag, safety, utility,
//! energy) with flat biases from the intent, role, opponent model, opening
//! book and endgame phase.

use crate::core::types::{PlayerId, Position, UnitType};
use crate::game::board::{BuildingKind, MineType, Variant};
use crate::game::constants::{ore_reward, unit_stats};
use crate::game::rules::{calculate_attack_damage, can_general_attack, display_cost, CostKind};
use crate::game::state::{Branch, GameState};
use crate::game::units::Unit;

use super::difficulty::Difficulty;
use super::opening::opening_action_bias;
use super::roles::formation_bonus;
use super::types::{
    ActionType, EndgameMode, Intent, OpeningPlan, PlanningContext, Role, ScoreBreakdown, Target, ThreatMap,
    IMPASSABLE_RISK,
};

/// Stepping straight back onto the cell just left
const BACKTRACK_PENALTY: f32 = 4.5;
/// Re-entering a cell left during the last three moves
const LOOP_PENALTY: f32 = 5.0;
const LOOP_WINDOW: usize = 3;
const ORE_UTILITY_SCALE: f32 = 0.6;

fn map_risk(map: &ThreatMap, pos: Position) -> Option<f32> {
    if pos.r < 0 || pos.c < 0 {
        return None;
    }
    map.get(pos.r as usize)?.get(pos.c as usize).copied()
}

/// Hotspot weight near `pos`, each cell discounted by `dist + 1`
pub fn hotspot_pressure(context: Option<&PlanningContext>, pos: Position, radius: i32) -> f32 {
    let Some(context) = context else {
        return 0.0;
    };
    context
        .hotspot_cells
        .iter()
        .filter_map(|cell| {
            let dist = cell.pos.manhattan(&pos);
            (dist <= radius).then(|| cell.weight / (dist + 1) as f32)
        })
        .sum()
}

/// Danger of `unit` entering `pos`; `IMPASSABLE_RISK` means never
pub fn cell_risk(state: &GameState, unit: &Unit, pos: Position, threat_map: Option<&ThreatMap>) -> f32 {
    if !GameState::in_bounds(pos) || state.is_obstacle(pos) || state.is_occupied(pos) {
        return IMPASSABLE_RISK;
    }

    let owner = unit.owner();
    let enemy = owner.opponent();

    let mut risk = match threat_map {
        Some(map) => map_risk(map, pos).unwrap_or(0.0),
        None => {
            let mut estimate = 0.0;
            if state.mines_of(enemy).any(|m| m.pos == pos) {
                estimate += 90.0;
            }
            let nuke_nearby = state.mines_of(enemy).any(|m| {
                m.kind == MineType::Nuke && m.pos.chebyshev(&pos) <= 1 && m.pos.chebyshev(&unit.pos) > 1
            });
            if nuke_nearby {
                estimate += 70.0;
            }
            estimate
        }
    };

    let enemy_player = state.player(enemy);
    if enemy_player
        .levels(UnitType::General)
        .has_variant(Branch::B, Variant::Second)
    {
        let flag = enemy_player.flag_position;
        if unit.pos.chebyshev(&flag) > 1 && pos.chebyshev(&flag) <= 1 {
            risk += 18.0;
        }
    }

    let adjacent = enemy_player
        .living_units()
        .filter(|u| u.pos.chebyshev(&pos) <= 1)
        .count();
    if adjacent > 0 {
        let per_enemy = if unit.hp_ratio_or(1.0) < 0.5 { 12.0 } else { 7.0 };
        risk += adjacent as f32 * per_enemy;
    }

    risk
}

/// How urgently `unit` should act, without planning context
pub fn evaluate_unit_priority(state: &GameState, unit: &Unit, difficulty: Difficulty) -> ScoreBreakdown {
    let w = difficulty.weights();
    let owner = state.player(unit.owner());
    let enemy = state.player(unit.owner().opponent());

    let attack = if unit.kind() == UnitType::General
        && enemy.living_units().any(|t| can_general_attack(unit, t, state))
    {
        12.0
    } else {
        0.0
    };
    let flag = (12 - unit.pos.manhattan(&enemy.flag_position)).max(0) as f32;
    let safety = if unit.hp_ratio_or(0.0) < 0.4 { 8.0 } else { 3.0 };
    let move_cost = display_cost(unit, unit_stats(unit.kind()).move_cost, state, CostKind::Move);
    let energy = if owner.energy <= 0 {
        0.0
    } else {
        (8.0 - move_cost as f32 / owner.energy.max(1) as f32 * 20.0).max(0.0)
    };

    let total = attack * w.unit_attack_opportunity
        + flag * w.unit_flag_pressure
        + safety * w.unit_survival
        + energy * w.unit_energy_efficiency;

    ScoreBreakdown {
        total,
        attack: Some(attack),
        flag: Some(flag),
        safety: Some(safety),
        energy: Some(energy),
        utility: None,
    }
}

pub fn evaluate_unit_priority_with_context(
    state: &GameState,
    unit: &Unit,
    difficulty: Difficulty,
    context: Option<&PlanningContext>,
) -> ScoreBreakdown {
    let base = evaluate_unit_priority(state, unit, difficulty);
    let Some(context) = context else {
        return base;
    };

    let kind = unit.kind();
    let is_runner = matches!(kind, UnitType::General | UnitType::Ranger);
    let mut total = base.total;

    match context.intent {
        Intent::PushFlag => {
            if unit.has_flag {
                total += 8.0;
            }
            if is_runner {
                total += 2.0;
            }
        }
        Intent::HuntFlagCarrier => {
            if is_runner {
                total += 4.0;
            }
            if kind == UnitType::Minesweeper {
                total += 1.5;
            }
        }
        Intent::ControlMines => {
            if matches!(kind, UnitType::Minesweeper | UnitType::Defuser | UnitType::Maker) {
                total += 4.0;
            }
        }
        Intent::Stabilize => {
            if unit.hp_ratio_or(1.0) <= 0.5 {
                total += 3.0;
            }
            if matches!(kind, UnitType::Defuser | UnitType::Minesweeper) {
                total += 2.0;
            }
        }
    }

    if let Some(role) = context.role_of(unit.id) {
        total += formation_bonus(state, unit, role, context.intent, unit.owner());
    }

    let model = &context.opponent_model;
    if model.flag_rush >= 4.5 && is_runner {
        total += 2.0;
    }
    if model.mine_pressure >= 4.5 && matches!(kind, UnitType::Minesweeper | UnitType::Defuser) {
        total += 2.8;
    }

    if let Some(plan) = context.opening.plan.filter(|_| context.opening.is_opening) {
        let weight = context.opening.weight;
        match plan {
            OpeningPlan::CenterBreak if is_runner => total += 1.6 * weight,
            OpeningPlan::MineScreen if matches!(kind, UnitType::Maker | UnitType::Minesweeper) => {
                total += 1.5 * weight
            }
            OpeningPlan::Fortress if kind == UnitType::Defuser => total += 1.8 * weight,
            _ => {}
        }
    }

    if context.endgame.is_endgame {
        let urgency = context.endgame.urgency;
        match context.endgame.mode {
            EndgameMode::Race => {
                if unit.has_flag {
                    total += 6.5 * urgency;
                }
                if is_runner {
                    total += 2.1 * urgency;
                }
            }
            EndgameMode::Defense => {
                let own_flag = state.player(unit.owner()).flag_position;
                let dist = unit.pos.manhattan(&own_flag);
                total += (6 - dist).max(0) as f32 * 0.8 * urgency;
                if matches!(kind, UnitType::Minesweeper | UnitType::Defuser | UnitType::General) {
                    total += 1.8 * urgency;
                }
            }
            EndgameMode::Attrition => {
                let low_hp = unit.max_hp > 0 && unit.hp_ratio_or(1.0) < 0.45;
                total += if low_hp { 1.2 } else { 0.5 } * urgency;
            }
            EndgameMode::None => {}
        }
    }

    ScoreBreakdown { total, ..base }
}

fn intent_action_bonus(intent: Intent, kind: ActionType) -> f32 {
    use ActionType::*;
    match intent {
        Intent::PushFlag => match kind {
            Move => 3.0,
            PickupFlag => 12.0,
            Attack => 1.5,
            Teleport => 2.0,
            PlaceHub => 1.1,
            DropFlag => -10.0,
            EndTurn => -2.0,
            _ => 0.0,
        },
        Intent::HuntFlagCarrier => match kind {
            Attack => 5.0,
            Move => 2.2,
            Scan => 1.4,
            SensorScan => 1.8,
            DropFlag => -2.0,
            _ => 0.0,
        },
        Intent::ControlMines => match kind {
            Scan => 4.5,
            SensorScan => 5.2,
            Disarm => 4.2,
            PlaceTower => 2.2,
            DetonateTower => 3.4,
            PlaceMine => 3.5,
            ThrowMine => 2.1,
            PickupMine => 1.7,
            MoveMine => 3.2,
            ConvertMine => 3.6,
            EvolveA => 0.8,
            EvolveB => 1.4,
            EvolveB1 | EvolveB2 => 1.8,
            Move => 0.8,
            _ => 0.0,
        },
        Intent::Stabilize => match kind {
            Disarm => 2.4,
            Scan => 1.8,
            SensorScan => 2.4,
            PlaceTower => 1.5,
            Teleport => 1.2,
            Move => -0.8,
            PlaceMine => -1.2,
            EvolveA | EvolveB => 1.2,
            EvolveA1 | EvolveA2 | EvolveB1 | EvolveB2 => 1.4,
            Attack => -1.0,
            EndTurn => 1.2,
            _ => 0.0,
        },
    }
}

fn role_action_bonus(role: Role, kind: ActionType) -> f32 {
    use ActionType::*;
    match role {
        Role::Striker => match kind {
            Attack => 4.2,
            Move => 1.8,
            ThrowMine => 1.6,
            Teleport => 1.4,
            PickupFlag => 2.2,
            EndTurn => -0.8,
            _ => 0.0,
        },
        Role::Flanker => match kind {
            Move => 2.2,
            Attack => 1.5,
            Scan => 1.2,
            SensorScan => 1.4,
            EvolveA | EvolveB | PlaceMine => 0.8,
            _ => 0.0,
        },
        Role::Controller => match kind {
            PlaceMine => 4.3,
            PlaceTower => 2.2,
            DetonateTower | MoveMine => 2.6,
            ConvertMine | Disarm | SensorScan => 2.8,
            Scan => 2.3,
            EvolveA => 1.4,
            EvolveB => 1.6,
            Attack => -0.6,
            _ => 0.0,
        },
        Role::Scout => match kind {
            Scan => 4.1,
            SensorScan => 4.6,
            PickupMine => 1.2,
            Move => 1.6,
            EvolveB => 0.8,
            Disarm => 1.8,
            _ => 0.0,
        },
        Role::Support => match kind {
            Disarm => 4.2,
            Scan => 2.2,
            SensorScan => 2.8,
            PlaceHub | PlaceTower => 1.4,
            PlaceFactory | EvolveB | Move => 1.2,
            PickupFlag => -0.8,
            _ => 0.0,
        },
    }
}

fn opponent_bias(context: &PlanningContext, kind: ActionType) -> f32 {
    use ActionType::*;
    let model = &context.opponent_model;
    let mut bias = 0.0;
    if model.mine_pressure >= 4.5 {
        match kind {
            Scan | SensorScan | Disarm => bias += 1.8,
            PlaceMine | PlaceTower | MoveMine | ConvertMine => bias += 1.1,
            _ => {}
        }
    }
    if model.flag_rush >= 4.5 {
        match kind {
            Attack => bias += 2.3,
            Move | Teleport => bias += 1.2,
            _ => {}
        }
    }
    if model.aggression >= 5.5 {
        if kind == EndTurn && context.intent == Intent::Stabilize {
            bias += 1.0;
        }
        if kind == DropFlag {
            bias += 0.8;
        }
    }
    bias
}

fn endgame_action_bias(
    state: &GameState,
    context: &PlanningContext,
    unit: &Unit,
    kind: ActionType,
    target: Option<Position>,
) -> f32 {
    use ActionType::*;
    if !context.endgame.is_endgame {
        return 0.0;
    }
    let urgency = context.endgame.urgency;

    match context.endgame.mode {
        EndgameMode::Race => match kind {
            Move if unit.has_flag => 2.2 * urgency,
            PickupFlag => 1.6 * urgency,
            Teleport => 1.5 * urgency,
            Attack => 1.1 * urgency,
            DropFlag => -2.7 * urgency,
            EndTurn => -1.8 * urgency,
            _ => 0.0,
        },
        EndgameMode::Defense => match kind {
            Attack => 2.5 * urgency,
            Scan | SensorScan | Disarm => 1.6 * urgency,
            PlaceTower | ConvertMine | MoveMine => 1.3 * urgency,
            DropFlag => 1.1 * urgency,
            EndTurn => -1.5 * urgency,
            Move => match target {
                Some(to) => {
                    let own_flag = state.player(unit.owner()).flag_position;
                    let gain = unit.pos.manhattan(&own_flag) - to.manhattan(&own_flag);
                    gain.max(0) as f32 * 0.9 * urgency
                }
                None => 0.0,
            },
            _ => 0.0,
        },
        EndgameMode::Attrition => match kind {
            Attack => 1.2 * urgency,
            DetonateTower | ThrowMine => 1.3 * urgency,
            Move => 0.7 * urgency,
            EndTurn => -0.8 * urgency,
            _ => 0.0,
        },
        EndgameMode::None => 0.0,
    }
}

/// Penalty for walking back over the unit's own recent path
fn move_hygiene_penalty(state: &GameState, unit: &Unit, to: Position) -> f32 {
    let mut penalty = 0.0;
    let mut recent = state.recent_movements(unit.id).take(LOOP_WINDOW).peekable();

    if let Some(last) = recent.peek() {
        if last.to == unit.pos && last.from == to {
            penalty += BACKTRACK_PENALTY;
        }
    }
    penalty += recent.filter(|m| m.from == to).count() as f32 * LOOP_PENALTY;
    penalty
}

fn enemies_within(state: &GameState, enemy: PlayerId, pos: Position, radius: i32) -> usize {
    state
        .player(enemy)
        .living_units()
        .filter(|u| u.pos.chebyshev(&pos) <= radius)
        .count()
}

#[derive(Debug, Default)]
struct Terms {
    attack: f32,
    flag: f32,
    safety: f32,
    utility: f32,
}

/// Score one candidate action for `unit`
#[allow(clippy::too_many_arguments)]
pub fn evaluate_action(
    state: &GameState,
    unit: &Unit,
    kind: ActionType,
    target: Option<Target>,
    difficulty: Difficulty,
    energy_cost: i32,
    mine_type: Option<MineType>,
    context: Option<&PlanningContext>,
) -> ScoreBreakdown {
    let w = difficulty.weights();
    let owner = unit.owner();
    let enemy = owner.opponent();
    let enemy_flag = state.player(enemy).flag_position;
    let own_flag = state.player(owner).flag_position;
    let role = context.and_then(|ctx| ctx.role_of(unit.id));
    let threat_map = context.map(|ctx| &ctx.threat_map);

    let cell = target.and_then(|t| t.cell_pos());
    let target_unit = target
        .and_then(|t| t.unit_id())
        .and_then(|id| state.unit(id));

    let mut t = Terms::default();
    let mut energy = (10 - energy_cost).max(0) as f32;
    let mut hygiene = 0.0;

    match kind {
        ActionType::Move => {
            if let Some(to) = cell {
                let current = unit.pos.manhattan(&enemy_flag);
                let next = to.manhattan(&enemy_flag);
                let advance = (current - next).max(0) as f32;
                t.flag = advance * if unit.has_flag { 6.0 } else { 3.0 };
                t.safety = (20.0 - cell_risk(state, unit, to, threat_map)).max(0.0);
                let pressure = hotspot_pressure(context, to, 4);

                match role {
                    Some(Role::Striker) => t.utility += advance * 1.4 + pressure * 0.45,
                    Some(Role::Flanker) => {
                        t.utility += (to.c - own_flag.c).abs() as f32 * 0.5 + pressure * 0.35;
                    }
                    Some(Role::Controller) => {
                        let center_col = (enemy_flag.c + own_flag.c) as f32 / 2.0;
                        t.utility += (4.0 - (to.c as f32 - center_col).abs()).max(0.0) * 1.2;
                        t.utility += pressure * 0.55;
                    }
                    Some(Role::Scout) => t.utility += pressure * 0.9,
                    Some(Role::Support) => {
                        let before = unit.pos.manhattan(&own_flag);
                        let after = to.manhattan(&own_flag);
                        t.utility += (before - after).max(0) as f32 * 1.1;
                        t.safety += (4 - after).max(0) as f32 * 0.5;
                    }
                    None => {}
                }

                if let Some(size) = state.cell(to).and_then(|c| c.ore) {
                    t.utility += ore_reward(size) as f32 * ORE_UTILITY_SCALE;
                }
                hygiene = move_hygiene_penalty(state, unit, to);
            }
        }
        ActionType::Attack => {
            if let Some(victim) = target_unit {
                let damage = calculate_attack_damage(victim, state.player(victim.owner()));
                let kill = if victim.hp - damage <= 0 { 10.0 } else { 0.0 };
                let carrier = if victim.has_flag { 8.0 } else { 0.0 };
                t.attack = damage as f32 * 2.0 + kill + carrier;
                t.safety = 7.0;
            }
        }
        ActionType::Scan => {
            let mut base = 6.0;
            if let Some(at) = cell {
                let nearby = enemies_within(state, enemy, at, 2) as f32;
                let near_flag = if at.manhattan(&enemy_flag) <= 3 { 3.0 } else { 0.0 };
                let unrevealed = state
                    .mines_of(enemy)
                    .filter(|m| !m.is_visible_to(owner) && m.pos.chebyshev(&at) <= 2)
                    .count() as f32;
                base += nearby * 2.0 + near_flag + unrevealed * 2.0 + hotspot_pressure(context, at, 4) * 0.8;
            }
            t.utility = base;
            t.safety = 6.0;
        }
        ActionType::SensorScan => {
            let mut base = 7.5;
            if let Some(at) = cell {
                let nearby = enemies_within(state, enemy, at, 2) as f32;
                let near_flag = if at.manhattan(&enemy_flag) <= 3 { 3.5 } else { 0.0 };
                base += nearby * 2.2 + near_flag + hotspot_pressure(context, at, 4) * 0.9;
            }
            t.utility = base;
            t.safety = 6.5;
        }
        ActionType::PlaceMine => {
            if let Some(at) = cell {
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 4 { 8.0 } else { 3.0 };
                let min_dist = state
                    .player(enemy)
                    .living_units()
                    .map(|u| at.manhattan(&u.pos))
                    .min()
                    .unwrap_or(6);
                let unit_pressure = match min_dist {
                    d if d <= 2 => 8.0,
                    d if d <= 4 => 4.0,
                    _ => 0.0,
                };
                let type_bonus = match mine_type {
                    Some(MineType::Slow) => if min_dist <= 2 { 6.0 } else { 2.0 },
                    Some(MineType::Smoke) => if min_dist <= 3 { 4.0 } else { 1.0 },
                    Some(MineType::Chain) => if near_enemy_flag >= 8.0 { 6.0 } else { 3.0 },
                    Some(MineType::Nuke) => if enemies_within(state, enemy, at, 2) >= 2 { 10.0 } else { 4.0 },
                    Some(MineType::Normal) | None => 0.0,
                };
                t.utility = near_enemy_flag + unit_pressure + type_bonus + hotspot_pressure(context, at, 3) * 0.75;
                t.safety = (14.0 - cell_risk(state, unit, at, threat_map)).max(0.0);
            }
        }
        ActionType::PlaceTower => {
            if let Some(at) = cell {
                let covered = state.mines_of(enemy).filter(|m| m.pos.chebyshev(&at) <= 1).count() as f32;
                let nearby = enemies_within(state, enemy, at, 2) as f32;
                t.utility = 8.0 + covered * 4.0 + nearby * 1.6;
                t.safety = 6.5;
            }
        }
        ActionType::DetonateTower => {
            let towers: Vec<_> = state
                .buildings_of(owner, BuildingKind::Tower)
                .collect();
            let mines_hit = state
                .mines_of(enemy)
                .filter(|m| towers.iter().any(|tw| tw.covers(m.pos)))
                .count() as f32;
            let units_hit = state
                .player(enemy)
                .living_units()
                .filter(|u| towers.iter().any(|tw| tw.covers(u.pos)))
                .count() as f32;
            t.attack = units_hit * 5.5;
            t.utility = 9.0 + mines_hit * 3.5;
            t.safety = 5.5;
        }
        ActionType::PlaceFactory => {
            if let Some(at) = cell {
                t.utility = 7.0 + (10 - at.manhattan(&enemy_flag)).max(0) as f32 * 0.4;
                t.safety = 5.0;
            }
        }
        ActionType::PlaceHub => {
            if let Some(at) = cell {
                t.utility = 8.0
                    + (9 - at.manhattan(&enemy_flag)).max(0) as f32 * 0.35
                    + (6 - at.manhattan(&own_flag)).max(0) as f32 * 0.25;
                t.safety = 5.5;
            }
        }
        ActionType::Teleport => {
            if let Some(to) = cell {
                let push = (unit.pos.manhattan(&enemy_flag) - to.manhattan(&enemy_flag)).max(0) as f32;
                let defend = (unit.pos.manhattan(&own_flag) - to.manhattan(&own_flag)).max(0) as f32;
                t.flag = push * if unit.has_flag { 4.0 } else { 2.2 };
                t.utility = 6.0 + push * 1.8 + defend * 1.1;
                t.safety = (20.0 - cell_risk(state, unit, to, threat_map)).max(0.0);
            }
        }
        ActionType::ThrowMine => {
            if let Some(at) = cell {
                let hit = state
                    .player(enemy)
                    .living_units()
                    .filter(|u| u.pos == at)
                    .count() as f32;
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 3 { 6.0 } else { 2.0 };
                t.attack = hit * 8.5;
                t.utility = 7.0 + near_enemy_flag + hit * 3.5;
                t.safety = 5.2;
            }
        }
        ActionType::PickupMine => {
            if let Some(at) = cell {
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 4 { 3.0 } else { 0.0 };
                let own_mine = state.mine_at(at).map(|m| m.owner == owner).unwrap_or(false);
                t.utility = 6.5 + near_enemy_flag + if own_mine { 2.0 } else { 0.0 };
                t.safety = 6.0;
            }
        }
        ActionType::DropMine => {
            if let Some(at) = cell {
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 4 { 6.0 } else { 2.0 };
                t.utility = 6.0 + near_enemy_flag;
                t.safety = 5.8;
            }
        }
        ActionType::MoveMine => {
            if let Some(at) = cell {
                let enemy_near = state
                    .player(enemy)
                    .living_units()
                    .filter(|u| u.pos.manhattan(&at) <= 1)
                    .count() as f32;
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 4 { 5.0 } else { 1.0 };
                t.utility = 8.0 + enemy_near * 2.4 + near_enemy_flag;
                t.safety = 5.2;
            }
        }
        ActionType::ConvertMine => {
            if let Some(at) = cell {
                let near_enemy_flag = if at.manhattan(&enemy_flag) <= 4 { 5.5 } else { 2.0 };
                t.utility = 9.0 + near_enemy_flag;
                t.safety = 6.2;
            }
        }
        ActionType::Disarm => {
            let (local, pressure) = match cell {
                Some(at) => (enemies_within(state, enemy, at, 2) as f32, hotspot_pressure(context, at, 3)),
                None => (0.0, 0.0),
            };
            t.utility = 9.0 + local * 2.0 + pressure * 0.65;
            t.safety = 7.0;
        }
        ActionType::PickupFlag => {
            t.flag = 12.0;
            t.utility = 5.0;
        }
        ActionType::DropFlag => {
            let pressed = enemies_within(state, enemy, unit.pos, 2) >= 2;
            t.utility = if pressed { 7.0 } else { 2.0 };
            t.safety = if pressed { 10.0 } else { 3.0 };
        }
        ActionType::EvolveA
        | ActionType::EvolveA1
        | ActionType::EvolveA2
        | ActionType::EvolveB
        | ActionType::EvolveB1
        | ActionType::EvolveB2 => {
            let (branch, variant) = kind.evolution().unwrap_or((Branch::A, None));
            let current = state.player(owner).levels(unit.kind()).level(branch);
            let next_level = (current + 1).min(3);
            t.utility = 7.0 + next_level as f32 * 2.2;
            t.safety = 4.5;

            match (branch, unit.kind()) {
                (Branch::A, UnitType::General) => t.attack += 4.5,
                (Branch::B, UnitType::General) => t.flag += 4.5,
                (Branch::A, UnitType::Ranger) => {
                    t.flag += 2.5;
                    t.utility += 1.5;
                }
                (Branch::B, UnitType::Maker) => t.utility += 2.0,
                (Branch::B, UnitType::Defuser) => t.safety += 1.8,
                _ => {}
            }
            if variant.is_some() {
                t.utility += 1.2;
            }
        }
        ActionType::EndTurn => {
            t.utility = 0.5;
            t.safety = 1.5;
            energy = 1.0;
        }
    }

    let mut bias = 0.0;
    if let Some(ctx) = context {
        if energy_cost > 0 {
            let remaining = state.player(owner).energy - energy_cost;
            let shortfall = (ctx.reserve_energy - remaining).max(0) as f32;
            energy = (energy - shortfall * 1.6).max(0.0);
        }

        let target_pos = cell.or_else(|| target_unit.map(|u| u.pos));
        bias += intent_action_bonus(ctx.intent, kind);
        bias += role.map(|r| role_action_bonus(r, kind)).unwrap_or(0.0);
        bias += opponent_bias(ctx, kind);
        bias += opening_action_bias(ctx, unit, kind, target_pos, mine_type);
        bias += endgame_action_bias(state, ctx, unit, kind, target_pos);
    }

    let total = t.attack * w.action_damage
        + t.flag * w.action_flag_pressure
        + t.safety * w.action_safety
        + t.utility * w.action_utility
        + energy * 0.6
        + bias
        - hygiene;

    ScoreBreakdown {
        total,
        attack: Some(t.attack),
        flag: Some(t.flag),
        safety: Some(t.safety),
        utility: Some(t.utility),
        energy: Some(energy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::build_planning_context;
    use crate::ai::tuning::TuningProfile;
    use crate::ai::types::{HotspotCell, OpponentModel};
    use crate::core::types::UnitId;
    use crate::game::board::{Mine, OreSize};
    use crate::game::state::{GameMode, Movement};

    fn setup() -> GameState {
        let mut state = GameState::new_match(GameMode::Pve);
        state.current_player = PlayerId::P2;
        state.turn_count = 4;
        for id in PlayerId::ALL {
            state.player_mut(id).energy = 80;
            for unit in &mut state.player_mut(id).units {
                unit.start_of_action_energy = 80;
            }
        }
        state
    }

    fn place(state: &mut GameState, owner: PlayerId, kind: UnitType, pos: Position) -> Unit {
        let unit = state.unit_mut(UnitId::new(owner, kind)).expect("unit exists");
        unit.pos = pos;
        unit.clone()
    }

    fn context(state: &GameState) -> PlanningContext {
        build_planning_context(
            state,
            Difficulty::Normal,
            PlayerId::P2,
            &OpponentModel::initial(),
            None,
            TuningProfile::Balanced,
        )
    }

    fn move_total(state: &GameState, unit: &Unit, to: Position, ctx: Option<&PlanningContext>) -> f32 {
        evaluate_action(state, unit, ActionType::Move, Some(Target::cell(to)), Difficulty::Normal, 2, None, ctx).total
    }

    #[test]
    fn test_cell_risk_blocks_occupied_and_off_board() {
        let state = setup();
        let unit = state.unit(UnitId::new(PlayerId::P2, UnitType::Ranger)).cloned().unwrap();
        assert_eq!(cell_risk(&state, &unit, Position::new(-1, 3), None), IMPASSABLE_RISK);
        assert_eq!(cell_risk(&state, &unit, Position::new(2, 22), None), IMPASSABLE_RISK);
        assert_eq!(cell_risk(&state, &unit, Position::new(3, 12), None), 0.0);
    }

    #[test]
    fn test_cell_risk_without_map_counts_mines() {
        let mut state = setup();
        let unit = place(&mut state, PlayerId::P2, UnitType::Defuser, Position::new(3, 12));
        state.mines.push(Mine::new(MineType::Normal, PlayerId::P1, Position::new(3, 11)));
        state.mines.push(Mine::new(MineType::Nuke, PlayerId::P1, Position::new(0, 12)));
        assert_eq!(cell_risk(&state, &unit, Position::new(3, 11), None), 90.0);
        assert_eq!(cell_risk(&state, &unit, Position::new(1, 12), None), 70.0);
    }

    #[test]
    fn test_low_hp_raises_adjacent_risk() {
        let mut state = setup();
        let mut unit = place(&mut state, PlayerId::P2, UnitType::Ranger, Position::new(3, 12));
        place(&mut state, PlayerId::P1, UnitType::Maker, Position::new(3, 10));
        assert_eq!(cell_risk(&state, &unit, Position::new(3, 11), None), 7.0);
        unit.hp = 2;
        assert_eq!(cell_risk(&state, &unit, Position::new(3, 11), None), 12.0);
    }

    #[test]
    fn test_hotspot_pressure_falls_off() {
        let state = setup();
        let mut ctx = context(&state);
        ctx.hotspot_cells = vec![HotspotCell { pos: Position::new(3, 10), weight: 4.0 }];
        assert_eq!(hotspot_pressure(Some(&ctx), Position::new(3, 10), 3), 4.0);
        assert_eq!(hotspot_pressure(Some(&ctx), Position::new(3, 11), 3), 2.0);
        assert_eq!(hotspot_pressure(Some(&ctx), Position::new(3, 14), 3), 0.0);
        assert_eq!(hotspot_pressure(None, Position::new(3, 10), 3), 0.0);
    }

    #[test]
    fn test_lethal_attack_beats_move() {
        let mut state = setup();
        let general = place(&mut state, PlayerId::P2, UnitType::General, Position::new(3, 10));
        if let Some(maker) = state.unit_mut(UnitId::new(PlayerId::P1, UnitType::Maker)) {
            maker.pos = Position::new(3, 11);
            maker.hp = 4;
        }
        let ctx = context(&state);
        let maker_id = UnitId::new(PlayerId::P1, UnitType::Maker);
        let attack = evaluate_action(
            &state,
            &general,
            ActionType::Attack,
            Some(Target::unit(maker_id)),
            Difficulty::Normal,
            10,
            None,
            Some(&ctx),
        );
        let step = evaluate_action(
            &state,
            &general,
            ActionType::Move,
            Some(Target::cell(Position::new(3, 9))),
            Difficulty::Normal,
            4,
            None,
            Some(&ctx),
        );
        assert_eq!(attack.attack, Some(18.0));
        assert!(attack.total > step.total);
    }

    #[test]
    fn test_backtrack_scores_below_advance() {
        let mut state = setup();
        let ranger = place(&mut state, PlayerId::P2, UnitType::Ranger, Position::new(3, 11));
        state.movements.push(Movement {
            unit_id: ranger.id,
            from: Position::new(3, 12),
            to: Position::new(3, 11),
            energy: 2,
        });
        let ctx = context(&state);
        let forward = move_total(&state, &ranger, Position::new(3, 10), Some(&ctx));
        let back = move_total(&state, &ranger, Position::new(3, 12), Some(&ctx));
        assert!(forward > back);
    }

    #[test]
    fn test_loop_cells_score_below_fresh_cells() {
        let mut state = setup();
        let ranger = place(&mut state, PlayerId::P2, UnitType::Ranger, Position::new(4, 11));
        for (from, to) in [((3, 11), (3, 10)), ((3, 10), (4, 10)), ((4, 10), (4, 11))] {
            state.movements.push(Movement {
                unit_id: ranger.id,
                from: Position::new(from.0, from.1),
                to: Position::new(to.0, to.1),
                energy: 2,
            });
        }
        let ctx = context(&state);
        let revisit = move_total(&state, &ranger, Position::new(3, 11), Some(&ctx));
        let fresh = move_total(&state, &ranger, Position::new(5, 11), Some(&ctx));
        assert!(fresh > revisit);
    }

    #[test]
    fn test_ore_adds_utility() {
        let mut state = setup();
        let general = place(&mut state, PlayerId::P2, UnitType::General, Position::new(3, 10));
        let to = Position::new(3, 9);
        let plain = evaluate_action(&state, &general, ActionType::Move, Some(Target::cell(to)), Difficulty::Normal, 3, None, None);
        if let Some(cell) = state.cell_mut(to) {
            cell.ore = Some(OreSize::Medium);
        }
        let rich = evaluate_action(&state, &general, ActionType::Move, Some(Target::cell(to)), Difficulty::Normal, 3, None, None);
        assert!(rich.utility_or_zero() > plain.utility_or_zero());
    }

    #[test]
    fn test_chain_beats_normal_near_enemy_flag() {
        let mut state = setup();
        let maker = place(&mut state, PlayerId::P2, UnitType::Maker, Position::new(3, 2));
        state.p2.evolution_levels.maker.set(Branch::A, 3, Some(Variant::First));
        let ctx = context(&state);
        let at = Some(Target::cell(Position::new(3, 3)));
        let chain = evaluate_action(&state, &maker, ActionType::PlaceMine, at, Difficulty::Normal, 7, Some(MineType::Chain), Some(&ctx));
        let normal = evaluate_action(&state, &maker, ActionType::PlaceMine, at, Difficulty::Normal, 5, Some(MineType::Normal), Some(&ctx));
        assert!(chain.total > normal.total);
    }

    #[test]
    fn test_own_mine_pickup_outranks_enemy_mine() {
        let mut state = setup();
        let ranger = place(&mut state, PlayerId::P2, UnitType::Ranger, Position::new(3, 12));
        state.mines.push(Mine::new(MineType::Normal, PlayerId::P2, Position::new(3, 11)));
        let mut enemy_mine = Mine::new(MineType::Normal, PlayerId::P1, Position::new(2, 12));
        enemy_mine.revealed_to.push(PlayerId::P2);
        state.mines.push(enemy_mine);
        let ctx = context(&state);
        let own = evaluate_action(&state, &ranger, ActionType::PickupMine, Some(Target::cell(Position::new(3, 11))), Difficulty::Normal, 0, None, Some(&ctx));
        let theirs = evaluate_action(&state, &ranger, ActionType::PickupMine, Some(Target::cell(Position::new(2, 12))), Difficulty::Normal, 0, None, Some(&ctx));
        assert!(own.total > theirs.total);
    }

    #[test]
    fn test_end_turn_is_minimal() {
        let state = setup();
        let unit = state.unit(UnitId::new(PlayerId::P2, UnitType::Maker)).cloned().unwrap();
        let b = evaluate_action(&state, &unit, ActionType::EndTurn, None, Difficulty::Normal, 0, None, None);
        assert_eq!(b.energy, Some(1.0));
        assert_eq!(b.utility, Some(0.5));
        assert!((b.total - (1.5 * 1.2 + 0.5 + 0.6)).abs() < 1e-5);
    }

    #[test]
    fn test_reserve_shortfall_drains_energy_term() {
        let mut state = setup();
        let unit = place(&mut state, PlayerId::P2, UnitType::Minesweeper, Position::new(3, 15));
        let ctx = context(&state);
        let rich = evaluate_action(&state, &unit, ActionType::Scan, None, Difficulty::Normal, 3, None, Some(&ctx));
        state.p2.energy = 3;
        let poor = evaluate_action(&state, &unit, ActionType::Scan, None, Difficulty::Normal, 3, None, Some(&ctx));
        assert_eq!(rich.energy, Some(7.0));
        assert_eq!(poor.energy, Some(0.0));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let mut state = setup();
        let general = place(&mut state, PlayerId::P2, UnitType::General, Position::new(3, 10));
        let ctx = context(&state);
        let a = move_total(&state, &general, Position::new(2, 10), Some(&ctx));
        let b = move_total(&state, &general, Position::new(2, 10), Some(&ctx));
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_unit_priority_sees_attack_chance() {
        let mut state = setup();
        let general = place(&mut state, PlayerId::P2, UnitType::General, Position::new(3, 10));
        let idle = evaluate_unit_priority(&state, &general, Difficulty::Normal);
        place(&mut state, PlayerId::P1, UnitType::Maker, Position::new(3, 11));
        let hot = evaluate_unit_priority(&state, &general, Difficulty::Normal);
        assert_eq!(idle.attack, Some(0.0));
        assert_eq!(hot.attack, Some(12.0));
        assert!(hot.total > idle.total);
    }
}
