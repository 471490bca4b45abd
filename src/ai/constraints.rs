//! Last-word adjustments to the ranked list
//!
//! Hard constraints put kills, flag defense and a hurt General's safety
//! ahead of the raw scores. Move-streak diversification keeps a unit from
//! shuffling around the board when a useful non-move is nearly as good.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::core::types::{Position, UnitType};
use crate::game::board::{BuildingKind, Variant};
use crate::game::constants::{MINE_DAMAGE, MINE_SHOVE_RATIO, TOWER_BLAST_DAMAGE};
use crate::game::rules::calculate_attack_damage;
use crate::game::state::{Branch, GameState};
use crate::game::units::Unit;

use super::difficulty::Difficulty;
use super::types::{ActionType, CandidateAction, PlanningContext};

/// Consecutive moves before a non-move gets promoted
pub const MOVE_STREAK_TRIGGER: usize = 3;

/// An enemy carrier this close to our flag turns every unit into a defender
const URGENT_DEFENSE_RANGE: i32 = 5;
/// Any enemy this close to our flag pulls units home
const STRICT_DEFENSE_RANGE: i32 = 3;
const LOW_HP_GENERAL_RATIO: f32 = 0.4;

struct Adjusted {
    action: CandidateAction,
    bonus: f32,
    lethal: bool,
    lethal_on_carrier: bool,
}

impl Adjusted {
    fn key(&self) -> Reverse<OrderedFloat<f32>> {
        Reverse(OrderedFloat(self.action.ranked_score() + self.bonus))
    }
}

/// Board facts shared by every candidate of one unit
struct Situation<'a> {
    state: &'a GameState,
    unit: &'a Unit,
    context: &'a PlanningContext,
    own_flag: Position,
    enemies: Vec<&'a Unit>,
    carrier: Option<&'a Unit>,
    urgent_defense: bool,
    strict_defense: bool,
}

impl<'a> Situation<'a> {
    fn new(state: &'a GameState, unit: &'a Unit, context: &'a PlanningContext) -> Self {
        let own_flag = state.player(unit.owner()).flag_position;
        let enemies: Vec<&Unit> = state.player(unit.owner().opponent()).living_units().collect();
        let carrier = enemies.iter().copied().find(|u| u.has_flag);
        let urgent_defense = carrier.map_or(false, |c| c.pos.manhattan(&own_flag) <= URGENT_DEFENSE_RANGE);
        let strict_defense = enemies.iter().any(|e| e.pos.manhattan(&own_flag) <= STRICT_DEFENSE_RANGE);
        Self {
            state,
            unit,
            context,
            own_flag,
            enemies,
            carrier,
            urgent_defense,
            strict_defense,
        }
    }

    fn enemy_at(&self, pos: Position) -> Option<&'a Unit> {
        self.enemies.iter().copied().find(|u| u.pos == pos)
    }

    fn adjust(&self, action: CandidateAction) -> Adjusted {
        use ActionType::*;

        let mut bonus = 0.0;
        let mut lethal = false;
        let mut lethal_on_carrier = false;
        let cell = action.target_cell();
        let victim = action
            .target
            .and_then(|t| t.unit_id())
            .and_then(|id| self.state.unit(id))
            .filter(|u| u.is_alive());

        match action.kind {
            Attack => {
                if let Some(target) = victim {
                    let damage = calculate_attack_damage(target, self.state.player(target.owner()));
                    lethal = damage >= target.hp;
                    lethal_on_carrier = lethal && target.has_flag;
                    if lethal {
                        bonus += 120.0;
                    }
                    if target.has_flag {
                        bonus += 110.0;
                    }
                    if self.strict_defense && target.pos.manhattan(&self.own_flag) <= 2 {
                        bonus += 90.0;
                    }
                }
            }
            DetonateTower => {
                let owner = self.unit.owner();
                let killable: Vec<&Unit> = self
                    .enemies
                    .iter()
                    .copied()
                    .filter(|e| e.hp <= TOWER_BLAST_DAMAGE)
                    .filter(|e| self.state.buildings_of(owner, BuildingKind::Tower).any(|t| t.covers(e.pos)))
                    .collect();
                if !killable.is_empty() {
                    lethal = true;
                    bonus += killable.len() as f32 * 120.0;
                    if killable.iter().any(|e| e.has_flag) {
                        lethal_on_carrier = true;
                        bonus += 160.0;
                    }
                }
            }
            ThrowMine => {
                if let Some(target) = cell.and_then(|pos| self.enemy_at(pos)) {
                    let kills = target.hp <= MINE_DAMAGE;
                    if kills {
                        lethal = true;
                        bonus += 110.0;
                    }
                    if target.has_flag {
                        bonus += 95.0;
                        if kills {
                            lethal_on_carrier = true;
                            bonus += 120.0;
                        }
                    }
                }
            }
            MoveMine => {
                let shove = self
                    .state
                    .player(self.unit.owner())
                    .levels(UnitType::Defuser)
                    .has_variant(Branch::B, Variant::Second);
                if let Some(target) = cell.filter(|_| shove).and_then(|pos| self.enemy_at(pos)) {
                    let kills = target.hp <= (MINE_DAMAGE as f32 * MINE_SHOVE_RATIO).floor() as i32;
                    if kills {
                        lethal = true;
                        bonus += 95.0;
                    }
                    if target.has_flag {
                        bonus += 85.0;
                        if kills {
                            lethal_on_carrier = true;
                            bonus += 110.0;
                        }
                    }
                }
            }
            _ => {}
        }

        if let Some(carrier) = self.carrier.filter(|_| self.urgent_defense) {
            match (action.kind, cell) {
                (Attack, _) if victim.map_or(false, |t| t.has_flag) => bonus += 180.0,
                (Move | Teleport, Some(to)) => {
                    let before = self.unit.pos.manhattan(&carrier.pos);
                    let after = to.manhattan(&carrier.pos);
                    bonus += (before - after).max(0) as f32 * 30.0;
                    if after <= 1 {
                        bonus += 40.0;
                    }
                }
                (Scan | SensorScan, Some(at)) if at.manhattan(&carrier.pos) <= 1 => bonus += 35.0,
                (EndTurn, _) => bonus -= 180.0,
                _ => {}
            }
        }

        if self.strict_defense {
            match (action.kind, cell) {
                (Move | Teleport, Some(to)) => {
                    let before = self.unit.pos.manhattan(&self.own_flag);
                    let after = to.manhattan(&self.own_flag);
                    bonus += (before - after).max(0) as f32 * 22.0;
                    if after > before {
                        bonus -= 35.0;
                    }
                }
                (PlaceMine | PlaceTower | ConvertMine | MoveMine, Some(at)) if at.manhattan(&self.own_flag) <= 2 => {
                    bonus += 36.0
                }
                (EndTurn, _) => bonus -= 120.0,
                _ => {}
            }
        }

        let low_hp_general = self.unit.kind() == UnitType::General
            && self.unit.max_hp > 0
            && self.unit.hp as f32 / self.unit.max_hp as f32 <= LOW_HP_GENERAL_RATIO;
        if low_hp_general {
            match (action.kind, cell) {
                (Move | Teleport, Some(to)) => {
                    let risk = self.context.risk_at(to).unwrap_or(0.0);
                    if risk >= 22.0 {
                        bonus -= 220.0;
                    } else if risk <= 10.0 {
                        bonus += 20.0;
                    }
                }
                (Attack, _) if !lethal => bonus -= 60.0,
                _ => {}
            }
        }

        Adjusted {
            action,
            bonus,
            lethal,
            lethal_on_carrier,
        }
    }
}

/// Reorder `actions` so kills and flag defense come first
///
/// Kills of the enemy flag carrier lead, then any other kill, then the rest.
/// Each group is sorted by ranked score plus the situational bonus. Scores
/// themselves are left untouched.
pub fn apply_hard_constraints(
    state: &GameState,
    unit: &Unit,
    actions: Vec<CandidateAction>,
    context: &PlanningContext,
) -> Vec<CandidateAction> {
    if actions.len() <= 1 {
        return actions;
    }

    let situation = Situation::new(state, unit, context);
    let adjusted: Vec<Adjusted> = actions.into_iter().map(|a| situation.adjust(a)).collect();

    let (mut first, mut rest): (Vec<Adjusted>, Vec<Adjusted>) = if adjusted.iter().any(|a| a.lethal_on_carrier) {
        adjusted.into_iter().partition(|a| a.lethal_on_carrier)
    } else {
        adjusted.into_iter().partition(|a| a.lethal)
    };
    first.sort_by_key(Adjusted::key);
    rest.sort_by_key(Adjusted::key);
    first.into_iter().chain(rest).map(|a| a.action).collect()
}

/// After a run of moves, lift the best non-move within reach of the top
pub fn diversify_move_streak(
    mut actions: Vec<CandidateAction>,
    difficulty: Difficulty,
    recent: &[ActionType],
) -> Vec<CandidateAction> {
    if actions.len() <= 1 || actions[0].kind != ActionType::Move {
        return actions;
    }
    let on_streak = recent.len() >= MOVE_STREAK_TRIGGER
        && recent.iter().rev().take(MOVE_STREAK_TRIGGER).all(|kind| *kind == ActionType::Move);
    if !on_streak {
        return actions;
    }

    let top = actions[0].ranked_score();
    let max_delta = difficulty.move_diversity_delta();
    let pick = actions.iter().skip(1).position(|a| {
        !matches!(a.kind, ActionType::Move | ActionType::EndTurn) && top - a.ranked_score() <= max_delta
    });
    if let Some(offset) = pick {
        let alternative = actions.remove(offset + 1);
        actions.insert(0, alternative);
    }
    actions
}
