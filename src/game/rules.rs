//! Rule helpers the engine consults
//!
//! Read-only over `GameState`. Costs, damage and attack legality follow the
//! live rule engine so projected states stay faithful to real play.

use crate::core::types::{PlayerId, UnitType};

use super::board::Variant;
use super::constants::{unit_stats, ENERGY_CAP_RATIO, TERRITORY_SPLIT_COL};
use super::state::{Branch, GameState, PlayerState};
use super::units::Unit;

/// Which adjustments `display_cost` applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    Move,
    Teleport,
    Evolve,
    Other,
}

pub fn is_in_enemy_territory(unit: &Unit) -> bool {
    match unit.owner() {
        PlayerId::P1 => unit.pos.c >= TERRITORY_SPLIT_COL,
        PlayerId::P2 => unit.pos.c < TERRITORY_SPLIT_COL,
    }
}

/// Surcharge for acting from the opponent's half of the board
pub fn enemy_territory_cost(unit: &Unit, base: i32) -> i32 {
    if !is_in_enemy_territory(unit) {
        return base;
    }
    if base < 5 {
        base + 1
    } else {
        base + 2
    }
}

/// Energy the rule engine will charge for an action
pub fn display_cost(unit: &Unit, base: i32, state: &GameState, kind: CostKind) -> i32 {
    if matches!(kind, CostKind::Teleport | CostKind::Evolve) {
        return base;
    }

    let mut cost = base;
    if kind == CostKind::Move {
        let ranger = state.player(unit.owner()).levels(UnitType::Ranger);
        if unit.kind() == UnitType::Ranger && ranger.b >= 3 {
            cost = 2;
        }

        let near_hub = state
            .hub_of(unit.owner())
            .map(|hub| hub.pos.manhattan(&unit.pos) <= 2)
            .unwrap_or(false);
        if near_hub {
            cost = (cost - 1).max(1);
        }

        if unit.status.move_cost_debuff > 0 {
            cost += unit.status.move_cost_debuff;
        }

        let permanent_stealth =
            unit.kind() == UnitType::Ranger && ranger.has_variant(Branch::B, Variant::First);
        if unit.status.is_stealthed && !permanent_stealth {
            cost = 3;
        }
    }

    enemy_territory_cost(unit, cost)
}

pub fn check_energy_cap(unit: &Unit, cost: i32) -> bool {
    let cap = (unit.start_of_action_energy as f32 * ENERGY_CAP_RATIO).floor() as i32;
    unit.energy_used_this_turn + cost <= cap
}

/// Damage a General hit deals to `target`, after the defender's flag aura
pub fn calculate_attack_damage(target: &Unit, target_player: &PlayerState) -> i32 {
    let base = unit_stats(UnitType::General).attack_damage;
    if target_player.levels(UnitType::General).b >= 2
        && target.pos.chebyshev(&target_player.flag_position) <= 2
    {
        return (base as f32 * 0.75).floor() as i32;
    }
    base
}

/// Base attack cost before territory, 6 for a flag-carrying A3-1 General
pub fn general_attack_base_cost(attacker: &Unit, state: &GameState) -> i32 {
    let levels = state.player(attacker.owner()).levels(UnitType::General);
    if attacker.has_flag && levels.has_variant(Branch::A, Variant::First) {
        6
    } else {
        unit_stats(UnitType::General).attack_cost
    }
}

pub fn general_attack_range(state: &GameState, attacker: &Unit) -> i32 {
    if state.player(attacker.owner()).levels(UnitType::General).a >= 2 {
        2
    } else {
        1
    }
}

/// In line, in range, allowed while carrying and affordable
pub fn can_general_attack(attacker: &Unit, target: &Unit, state: &GameState) -> bool {
    if attacker.kind() != UnitType::General || !target.is_alive() || attacker.owner() == target.owner() {
        return false;
    }

    let dist = attacker.pos.manhattan(&target.pos);
    if !attacker.pos.is_cardinal_to(&target.pos) || dist > general_attack_range(state, attacker) {
        return false;
    }

    let levels = state.player(attacker.owner()).levels(UnitType::General);
    if attacker.has_flag && !levels.has_variant(Branch::A, Variant::First) {
        return false;
    }

    let cost = enemy_territory_cost(attacker, general_attack_base_cost(attacker, state));
    if state.player(attacker.owner()).energy < cost {
        return false;
    }
    check_energy_cap(attacker, cost)
}
