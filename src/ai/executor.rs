//! Dispatch of a chosen action onto the live game
//!
//! `AiActions` is implemented by whatever owns the real game state. The
//! executor never mutates state itself; it only maps candidate fields onto
//! the matching callback. A unit that died or vanished between decision and
//! dispatch is silently skipped.

use serde::{Deserialize, Serialize};

use crate::core::types::{Position, UnitId, UnitType};
use crate::game::board::{MineType, Variant};
use crate::game::state::{Branch, GameState};
use crate::game::units::Unit;

use super::types::{ActionType, CandidateAction};

/// Generic carry actions of the Ranger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangerAction {
    Pickup,
    Drop,
}

/// Mutation boundary between the engine and the rule engine
pub trait AiActions {
    /// Handlers that read "the selected unit" rely on this being called first
    fn select_unit(&mut self, id: UnitId);

    fn attempt_move(&mut self, id: UnitId, to: Position, cost: i32);
    fn handle_attack(&mut self, attacker: UnitId, target: UnitId);
    fn handle_scan(&mut self, unit: &Unit, pos: Position);
    fn handle_sensor_scan(&mut self, id: UnitId, pos: Position);
    fn handle_mine_placement(&mut self, unit: &Unit, pos: Position, kind: MineType);
    fn handle_place_tower(&mut self, unit: &Unit, pos: Position);
    fn handle_place_factory(&mut self, unit: &Unit, pos: Position);
    fn handle_place_hub(&mut self, unit: &Unit, pos: Position);
    fn handle_teleport_to_hub(&mut self, unit: &Unit);
    fn handle_detonate_tower(&mut self, unit: &Unit);
    fn handle_throw_mine(&mut self, unit: &Unit, pos: Position);
    fn handle_pickup_mine_at(&mut self, unit: &Unit, pos: Position);
    fn handle_ranger_action(&mut self, action: RangerAction);
    fn handle_move_enemy_mine(&mut self, unit: &Unit, from: Position, to: Position);
    fn handle_convert_enemy_mine(&mut self, unit: &Unit, pos: Position);
    fn handle_disarm(&mut self, unit: &Unit, pos: Position);
    fn handle_pickup_flag(&mut self);
    fn handle_drop_flag(&mut self);
    fn handle_evolution(&mut self, kind: UnitType, branch: Branch, variant: Option<Variant>);

    /// Closes the unit's action; `None` passes the turn
    fn handle_action_complete(&mut self, id: Option<UnitId>);

    /// The live state after the last callback
    ///
    /// Sinks that expose it let the commander notice a refused action and
    /// fall through to the next ranked candidate.
    fn observed_state(&self) -> Option<&GameState> {
        None
    }
}

/// Whether dispatching for `unit_id` visibly changed the game
///
/// Any change to the unit, its side's energy, the turn, or the mine and
/// building counts counts as applied. A rule engine that refuses an
/// action leaves all of these untouched.
pub fn action_applied(before: &GameState, after: &GameState, unit_id: UnitId) -> bool {
    let (Some(was), Some(now)) = (before.unit(unit_id), after.unit(unit_id)) else {
        return false;
    };
    let owner = unit_id.owner;

    after.current_player != owner
        || now.has_acted_this_round
        || was.pos != now.pos
        || was.hp != now.hp
        || was.has_flag != now.has_flag
        || was.energy_used_this_turn != now.energy_used_this_turn
        || before.player(owner).energy != after.player(owner).energy
        || before.mines.len() != after.mines.len()
        || before.buildings.len() != after.buildings.len()
}

/// Forward `action` to exactly one `AiActions` callback
pub fn execute_action<A: AiActions + ?Sized>(action: &CandidateAction, state: &GameState, actions: &mut A) {
    let Some(unit) = state.unit(action.unit_id).filter(|u| u.is_alive()) else {
        return;
    };
    actions.select_unit(unit.id);

    let cell = action.target_cell();
    match action.kind {
        ActionType::Move => {
            if let Some(pos) = cell {
                actions.attempt_move(unit.id, pos, action.energy_cost);
            }
        }
        ActionType::Attack => {
            if let Some(target) = action.target.and_then(|t| t.unit_id()) {
                actions.handle_attack(unit.id, target);
            }
        }
        ActionType::Scan => {
            if let Some(pos) = cell {
                actions.handle_scan(unit, pos);
            }
        }
        ActionType::SensorScan => {
            if let Some(pos) = cell {
                actions.handle_sensor_scan(unit.id, pos);
            }
        }
        ActionType::PlaceMine => {
            if let Some(pos) = cell {
                actions.handle_mine_placement(unit, pos, action.mine_type.unwrap_or(MineType::Normal));
            }
        }
        ActionType::PlaceTower => actions.handle_place_tower(unit, unit.pos),
        ActionType::PlaceFactory => actions.handle_place_factory(unit, unit.pos),
        ActionType::PlaceHub => actions.handle_place_hub(unit, unit.pos),
        ActionType::Teleport => actions.handle_teleport_to_hub(unit),
        ActionType::DetonateTower => actions.handle_detonate_tower(unit),
        ActionType::ThrowMine => {
            if let Some(pos) = cell {
                actions.handle_throw_mine(unit, pos);
            }
        }
        ActionType::PickupMine => match cell {
            Some(pos) => actions.handle_pickup_mine_at(unit, pos),
            None => actions.handle_ranger_action(RangerAction::Pickup),
        },
        ActionType::DropMine => actions.handle_ranger_action(RangerAction::Drop),
        ActionType::MoveMine => {
            if let (Some(from), Some(to)) = (action.source_cell, cell) {
                actions.handle_move_enemy_mine(unit, from, to);
            }
        }
        ActionType::ConvertMine => {
            if let Some(pos) = cell {
                actions.handle_convert_enemy_mine(unit, pos);
            }
        }
        ActionType::Disarm => {
            if let Some(pos) = cell {
                actions.handle_disarm(unit, pos);
            }
        }
        ActionType::PickupFlag => actions.handle_pickup_flag(),
        ActionType::DropFlag => actions.handle_drop_flag(),
        ActionType::EvolveA
        | ActionType::EvolveA1
        | ActionType::EvolveA2
        | ActionType::EvolveB
        | ActionType::EvolveB1
        | ActionType::EvolveB2 => {
            if let Some((branch, variant)) = action.kind.evolution() {
                actions.handle_evolution(unit.kind(), branch, variant);
            }
        }
        ActionType::EndTurn => actions.handle_action_complete(Some(unit.id)),
    }
}
