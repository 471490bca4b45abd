//! Unit and action candidate generation
//!
//! Every legal action for a unit is enumerated, priced the way the rule
//! engine will price it, and scored through the evaluator. Wide families
//! (moves, scans, mine handling) are cut to their best few so the selector
//! and lookahead see a small, varied list. Every unit always gets an
//! `end_turn` candidate, so the list is never empty.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::types::{PlayerId, Position, UnitType};
use crate::game::board::{BuildingKind, MineType, Variant};
use crate::game::constants::{
    evolution_thresholds, mine_base_cost, unit_stats, EVOLUTION_COSTS, MAX_EVOLUTION_LEVEL, MAX_MINES_ON_BOARD,
};
use crate::game::rules::{
    can_general_attack, check_energy_cap, display_cost, enemy_territory_cost, general_attack_base_cost, CostKind,
};
use crate::game::state::{Branch, GameState};
use crate::game::units::Unit;

use super::difficulty::Difficulty;
use super::evaluator::{cell_risk, evaluate_action, evaluate_unit_priority_with_context};
use super::types::{ActionType, CandidateAction, CandidateUnit, PlanningContext, Target, IMPASSABLE_RISK};

const MOVE_LIMIT: usize = 4;
const SCAN_LIMIT: usize = 2;
const MINE_LIMIT: usize = 2;
const DISARM_LIMIT: usize = 2;
const PICKUP_LIMIT: usize = 3;
const THROW_LIMIT: usize = 5;
const MOVE_MINE_LIMIT: usize = 8;
const CONVERT_LIMIT: usize = 4;
/// Own mines above which a Defuser stops converting
const CONVERT_MINE_CAP: usize = 6;

/// Score every idle living unit of `ai_player`, plus symmetric jitter
pub fn generate_unit_candidates<R: Rng + ?Sized>(
    state: &GameState,
    difficulty: Difficulty,
    context: Option<&PlanningContext>,
    ai_player: PlayerId,
    rng: &mut R,
) -> Vec<CandidateUnit> {
    let jitter = difficulty.weights().random_jitter;

    state
        .player(ai_player)
        .units
        .iter()
        .filter(|u| u.is_idle())
        .map(|unit| {
            let mut breakdown = evaluate_unit_priority_with_context(state, unit, difficulty, context);
            let score = breakdown.total + (rng.gen::<f32>() * jitter - jitter / 2.0);
            breakdown.total = score;
            CandidateUnit { unit: unit.clone(), score, breakdown }
        })
        .collect()
}

/// Cells within Manhattan `radius` of `center` that lie on the board
fn cells_within(center: Position, radius: i32) -> impl Iterator<Item = Position> {
    (-radius..=radius)
        .flat_map(move |dr| (-radius..=radius).map(move |dc| center.offset(dr, dc)))
        .filter(move |pos| GameState::in_bounds(*pos) && center.manhattan(pos) <= radius)
}

fn best_of(mut candidates: Vec<CandidateAction>, limit: usize) -> Vec<CandidateAction> {
    candidates.sort_by_key(|a| Reverse(OrderedFloat(a.score)));
    candidates.truncate(limit);
    candidates
}

/// Scores candidates for one unit against one context
struct Scorer<'a> {
    state: &'a GameState,
    unit: &'a Unit,
    difficulty: Difficulty,
    context: Option<&'a PlanningContext>,
}

impl Scorer<'_> {
    fn score(&self, kind: ActionType, target: Option<Target>, cost: i32, mine_type: Option<MineType>) -> CandidateAction {
        let breakdown = evaluate_action(
            self.state,
            self.unit,
            kind,
            target,
            self.difficulty,
            cost,
            mine_type,
            self.context,
        );
        let mut action = CandidateAction::new(self.unit.id, kind, target, cost);
        action.mine_type = mine_type;
        action.score = breakdown.total;
        action.breakdown = breakdown;
        action
    }

    fn at_cell(&self, kind: ActionType, pos: Position, cost: i32) -> CandidateAction {
        self.score(kind, Some(Target::cell(pos)), cost, None)
    }

    fn affordable(&self, cost: i32) -> bool {
        self.state.player(self.unit.owner()).energy >= cost && check_energy_cap(self.unit, cost)
    }
}

/// Every legal action for `unit`, scored; never empty
pub fn generate_action_candidates(
    state: &GameState,
    unit: &Unit,
    difficulty: Difficulty,
    context: Option<&PlanningContext>,
) -> Vec<CandidateAction> {
    let scorer = Scorer { state, unit, difficulty, context };
    let mut actions = Vec::new();

    add_moves(&scorer, &mut actions);
    match unit.kind() {
        UnitType::General => add_attacks(&scorer, &mut actions),
        UnitType::Minesweeper => {
            add_scans(&scorer, &mut actions);
            add_tower_actions(&scorer, &mut actions);
        }
        UnitType::Maker => {
            add_mine_placements(&scorer, &mut actions);
            add_factory(&scorer, &mut actions);
        }
        UnitType::Defuser => {
            add_disarms(&scorer, &mut actions);
            add_mine_manipulation(&scorer, &mut actions);
        }
        UnitType::Ranger => add_ranger_actions(&scorer, &mut actions),
    }
    if unit.kind() != UnitType::Ranger {
        add_shared_teleport(&scorer, &mut actions);
    }
    add_evolutions(&scorer, &mut actions);
    add_flag_actions(&scorer, &mut actions);

    actions.push(scorer.score(ActionType::EndTurn, None, 0, None));
    actions
}

fn add_moves(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let cost = display_cost(s.unit, unit_stats(s.unit.kind()).move_cost, s.state, CostKind::Move);
    if !s.affordable(cost) {
        return;
    }
    let threat_map = s.context.map(|ctx| &ctx.threat_map);
    let moves = s
        .unit
        .pos
        .neighbors()
        .into_iter()
        .filter(|pos| s.state.can_occupy(*pos))
        .filter(|pos| cell_risk(s.state, s.unit, *pos, threat_map) < IMPASSABLE_RISK)
        .map(|pos| s.at_cell(ActionType::Move, pos, cost))
        .collect();
    actions.extend(best_of(moves, MOVE_LIMIT));
}

fn add_attacks(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let cost = enemy_territory_cost(s.unit, general_attack_base_cost(s.unit, s.state));
    let enemy = s.state.player(s.unit.owner().opponent());
    for target in enemy.living_units() {
        if can_general_attack(s.unit, target, s.state) {
            actions.push(s.score(ActionType::Attack, Some(Target::unit(target.id)), cost, None));
        }
    }
}

/// Enemy flag, then each living enemy and its four neighbours
fn scan_targets(state: &GameState, owner: PlayerId) -> Vec<Position> {
    let enemy = state.player(owner.opponent());
    let mut targets = vec![enemy.flag_position];
    for unit in enemy.living_units() {
        targets.push(unit.pos);
        targets.extend(unit.pos.neighbors());
    }
    targets
}

fn scan_candidates(s: &Scorer, kind: ActionType, targets: &[Position], cost: i32) -> Vec<CandidateAction> {
    let mut seen: Vec<Position> = Vec::new();
    let mut candidates = Vec::new();
    for pos in targets {
        if !GameState::in_bounds(*pos) || s.state.is_obstacle(*pos) || seen.contains(pos) {
            continue;
        }
        seen.push(*pos);
        candidates.push(s.at_cell(kind, *pos, cost));
    }
    best_of(candidates, SCAN_LIMIT)
}

fn add_scans(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let player = s.state.player(s.unit.owner());
    let base = if player.quest_stats.sweeper_scans_this_round >= 2 { 4 } else { 3 };
    let scan_cost = enemy_territory_cost(s.unit, base);
    let targets = scan_targets(s.state, s.unit.owner());

    if s.affordable(scan_cost) {
        actions.extend(scan_candidates(s, ActionType::Scan, &targets, scan_cost));
    }

    let level_b = player.levels(UnitType::Minesweeper).b;
    if level_b >= 1 {
        let sensor_cost = if level_b >= 3 { 4 } else { 5 };
        if s.affordable(sensor_cost) {
            let mut sensor_targets = targets;
            sensor_targets.push(s.unit.pos);
            actions.extend(scan_candidates(s, ActionType::SensorScan, &sensor_targets, sensor_cost));
        }
    }
}

/// Mine types the Maker has unlocked, cheapest unlock first
pub fn unlocked_mine_types(state: &GameState, owner: PlayerId) -> Vec<MineType> {
    let levels = state.player(owner).levels(UnitType::Maker);
    let mut types = vec![MineType::Normal];
    if levels.a >= 1 {
        types.push(MineType::Slow);
    }
    if levels.a >= 2 {
        types.push(MineType::Smoke);
    }
    if levels.has_variant(Branch::A, Variant::First) {
        types.push(MineType::Chain);
    }
    if levels.has_variant(Branch::A, Variant::Second) {
        types.push(MineType::Nuke);
    }
    types
}

fn add_mine_placements(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let types = unlocked_mine_types(s.state, owner);
    let mut candidates = Vec::new();

    for pos in s.unit.pos.neighbors() {
        if !s.state.can_occupy(pos) {
            continue;
        }
        let blocked = s
            .state
            .mines
            .iter()
            .any(|m| m.pos == pos && (m.owner == owner || m.is_visible_to(owner)));
        if blocked {
            continue;
        }
        for mine_type in &types {
            let cost = enemy_territory_cost(s.unit, mine_base_cost(*mine_type));
            if !s.affordable(cost) {
                continue;
            }
            candidates.push(s.score(ActionType::PlaceMine, Some(Target::cell(pos)), cost, Some(*mine_type)));
        }
    }
    actions.extend(best_of(candidates, MINE_LIMIT));
}

fn add_disarms(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let cost = enemy_territory_cost(s.unit, unit_stats(UnitType::Defuser).disarm_cost);
    if !s.affordable(cost) {
        return;
    }
    let candidates = s
        .state
        .mines_of(s.unit.owner().opponent())
        .filter(|m| m.pos.chebyshev(&s.unit.pos) <= 1)
        .map(|m| s.at_cell(ActionType::Disarm, m.pos, cost))
        .collect();
    actions.extend(best_of(candidates, DISARM_LIMIT));
}

fn add_tower_actions(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let levels = s.state.player(owner).levels(UnitType::Minesweeper);
    let twin_towers = levels.has_variant(Branch::A, Variant::First);
    let limit = if twin_towers { 2 } else { 1 };
    let towers: Vec<_> = s.state.buildings_of(owner, BuildingKind::Tower).collect();
    let on_own_tower = towers.iter().any(|t| t.pos == s.unit.pos);

    if levels.a >= 1 && towers.len() < limit && !on_own_tower {
        let cost = enemy_territory_cost(s.unit, if twin_towers { 5 } else { 6 });
        if s.affordable(cost) {
            actions.push(s.at_cell(ActionType::PlaceTower, s.unit.pos, cost));
        }
    }

    if levels.has_variant(Branch::A, Variant::Second) && !towers.is_empty() {
        let mine_in_range = s
            .state
            .mines_of(owner.opponent())
            .any(|m| towers.iter().any(|t| t.covers(m.pos)));
        let cost = 2;
        if mine_in_range && s.affordable(cost) {
            actions.push(s.at_cell(ActionType::DetonateTower, s.unit.pos, cost));
        }
    }
}

fn add_factory(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let levels = s.state.player(owner).levels(UnitType::Maker);
    if levels.b < 1 {
        return;
    }
    let limit = if levels.has_variant(Branch::B, Variant::Second) { 2 } else { 1 };
    let factories: Vec<_> = s.state.buildings_of(owner, BuildingKind::Factory).collect();
    let on_own_factory = factories.iter().any(|f| f.pos == s.unit.pos);
    let cost = enemy_territory_cost(s.unit, 6);
    if factories.len() < limit && !on_own_factory && s.affordable(cost) {
        actions.push(s.at_cell(ActionType::PlaceFactory, s.unit.pos, cost));
    }
}

fn add_ranger_actions(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let levels = *s.state.player(owner).levels(UnitType::Ranger);
    let hub = s.state.hub_of(owner);

    if levels.a >= 1 && hub.is_none() {
        let cost = display_cost(s.unit, 4, s.state, CostKind::Other);
        if s.affordable(cost) {
            actions.push(s.at_cell(ActionType::PlaceHub, s.unit.pos, cost));
        }
    }

    if let Some(hub) = hub.filter(|_| levels.a >= 2) {
        let cost = if levels.has_variant(Branch::A, Variant::Second) { 3 } else { 0 };
        let blocked = s.state.is_occupied_except(hub.pos, s.unit.id);
        if !blocked && s.affordable(cost) {
            actions.push(s.at_cell(ActionType::Teleport, hub.pos, cost));
        }
    }

    match &s.unit.carried_mine {
        None => {
            let range = if levels.b >= 1 { 2 } else { 0 };
            let candidates = s
                .state
                .mines
                .iter()
                .filter(|m| m.pos.manhattan(&s.unit.pos) <= range && (m.owner == owner || m.is_visible_to(owner)))
                .map(|m| s.at_cell(ActionType::PickupMine, m.pos, 0))
                .collect();
            actions.extend(best_of(candidates, PICKUP_LIMIT));
        }
        Some(carried) => {
            let here = s.unit.pos;
            let room = s.state.mines_of(owner).count() < MAX_MINES_ON_BOARD;
            if s.state.mine_at(here).is_none() && !s.state.is_obstacle(here) && room {
                actions.push(s.score(ActionType::DropMine, Some(Target::cell(here)), 0, Some(carried.kind)));
            }

            if levels.has_variant(Branch::B, Variant::Second) {
                let cost = enemy_territory_cost(s.unit, 5);
                if s.affordable(cost) {
                    let enemy = s.state.player(owner.opponent());
                    let candidates = cells_within(here, 2)
                        .filter(|pos| {
                            let enemy_here = enemy.living_units().any(|u| u.pos == *pos);
                            enemy_here || s.state.mine_at(*pos).is_none()
                        })
                        .map(|pos| s.score(ActionType::ThrowMine, Some(Target::cell(pos)), cost, Some(carried.kind)))
                        .collect();
                    actions.extend(best_of(candidates, THROW_LIMIT));
                }
            }
        }
    }
}

/// Hub teleport for every unit once the Ranger reaches A3-2
fn add_shared_teleport(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let ranger = s.state.player(owner).levels(UnitType::Ranger);
    if !ranger.has_variant(Branch::A, Variant::Second) {
        return;
    }
    let Some(hub) = s.state.hub_of(owner) else {
        return;
    };
    let cost = 5;
    if s.affordable(cost) && !s.state.is_occupied_except(hub.pos, s.unit.id) {
        actions.push(s.at_cell(ActionType::Teleport, hub.pos, cost));
    }
}

fn add_mine_manipulation(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let levels = s.state.player(owner).levels(UnitType::Defuser);
    let nearby: Vec<Position> = s
        .state
        .mines_of(owner.opponent())
        .filter(|m| m.pos.manhattan(&s.unit.pos) <= 2)
        .map(|m| m.pos)
        .collect();

    if levels.b >= 2 {
        let cost = if levels.has_variant(Branch::B, Variant::Second) { 5 } else { 2 };
        if s.affordable(cost) {
            let mut candidates = Vec::new();
            for source in &nearby {
                for dest in cells_within(s.unit.pos, 2).filter(|pos| pos != source) {
                    let mut action = s.at_cell(ActionType::MoveMine, dest, cost);
                    action.source_cell = Some(*source);
                    candidates.push(action);
                }
            }
            actions.extend(best_of(candidates, MOVE_MINE_LIMIT));
        }
    }

    if levels.has_variant(Branch::B, Variant::First) {
        let cost = 5;
        let own_mines = s.state.mines_of(owner).count();
        if own_mines < CONVERT_MINE_CAP && s.affordable(cost) {
            let candidates = nearby
                .iter()
                .map(|pos| s.at_cell(ActionType::ConvertMine, *pos, cost))
                .collect();
            actions.extend(best_of(candidates, CONVERT_LIMIT));
        }
    }
}

fn add_evolutions(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let owner = s.unit.owner();
    let player = s.state.player(owner);
    let levels = player.levels(s.unit.kind());

    for branch in [Branch::A, Branch::B] {
        let level = levels.level(branch);
        if level >= MAX_EVOLUTION_LEVEL {
            continue;
        }
        let idx = level as usize;
        let cost = EVOLUTION_COSTS[idx];
        let threshold = evolution_thresholds(s.unit.kind(), branch)[idx];
        let progress = player.quest_stats.progress(s.unit.kind(), branch);
        if player.energy < cost || progress < threshold {
            continue;
        }

        let forks: &[Option<Variant>] = if level == 2 && levels.variant(branch).is_none() {
            &[Some(Variant::First), Some(Variant::Second)]
        } else {
            &[None]
        };
        for variant in forks {
            actions.push(s.score(ActionType::evolve(branch, *variant), None, cost, None));
        }
    }
}

fn add_flag_actions(s: &Scorer, actions: &mut Vec<CandidateAction>) {
    let player = s.state.player(s.unit.owner());
    let can_carry = s.unit.kind() == UnitType::General || player.levels(UnitType::General).b >= 3;
    if can_carry && !s.unit.has_flag && s.unit.pos == player.flag_position {
        actions.push(s.score(ActionType::PickupFlag, None, 0, None));
    }
    if s.unit.has_flag {
        actions.push(s.score(ActionType::DropFlag, None, 0, None));
    }
}
