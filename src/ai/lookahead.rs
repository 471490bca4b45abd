//! Beam lookahead
//!
//! The top few candidates are replayed on a cloned state, the opponent's
//! greedy reply is projected on top, and the AI's own greedy follow-up is
//! scored after that. The projection is an approximation of the rule
//! engine: enough to see kills, lost mines and blocked hubs, nothing more.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::Rng;
use tracing::debug;

use crate::core::types::{PlayerId, Position, UnitId, UnitType};
use crate::game::board::{Building, BuildingKind, Mine, MineType, Variant};
use crate::game::constants::{MAX_EVOLUTION_LEVEL, MINE_DAMAGE, MINE_SHOVE_RATIO, TOWER_BLAST_DAMAGE};
use crate::game::rules::calculate_attack_damage;
use crate::game::state::{Branch, GameState};

use super::context::build_planning_context;
use super::difficulty::Difficulty;
use super::generator::{generate_action_candidates, generate_unit_candidates};
use super::selector::{select_best_action, select_best_unit};
use super::tuning::ProfileTuning;
use super::types::{ActionType, CandidateAction, OpponentModel};

/// Apply damage; a unit that dies drops the flag where it stood
fn strike(state: &mut GameState, id: UnitId, damage: i32) {
    let Some(target) = state.unit_mut(id).filter(|u| u.is_alive()) else {
        return;
    };
    let carried_flag = target.has_flag;
    let pos = target.pos;
    if target.take_damage(damage) {
        target.has_flag = false;
        if carried_flag {
            state.player_mut(id.owner).flag_position = pos;
        }
    }
}

/// Move a unit, dragging the flag along when it carries it
fn relocate(state: &mut GameState, id: UnitId, pos: Position) {
    let Some(unit) = state.unit_mut(id) else {
        return;
    };
    unit.pos = pos;
    if unit.has_flag {
        state.player_mut(id.owner).flag_position = pos;
    }
}

fn living_enemy_at(state: &GameState, owner: PlayerId, pos: Position) -> Option<UnitId> {
    state
        .player(owner.opponent())
        .living_units()
        .find(|u| u.pos == pos)
        .map(|u| u.id)
}

/// Drop the oldest own building of `kind` once `limit` is reached
fn make_room(state: &mut GameState, owner: PlayerId, kind: BuildingKind, limit: usize) {
    if state.buildings_of(owner, kind).count() < limit {
        return;
    }
    if let Some(idx) = state.buildings.iter().position(|b| b.owner == owner && b.kind == kind) {
        state.buildings.remove(idx);
    }
}

/// Clone `state` and apply `action` for the unit's owner
pub fn project_action(state: &GameState, action: &CandidateAction) -> GameState {
    let mut next = state.clone();
    let id = action.unit_id;
    let owner = id.owner;

    let Some(unit) = next.unit_mut(id).filter(|u| u.is_alive()) else {
        return next;
    };
    unit.energy_used_this_turn += action.energy_cost;
    unit.has_acted_this_round = true;
    let unit = unit.clone();
    let player = next.player_mut(owner);
    player.energy = (player.energy - action.energy_cost).max(0);

    let target_cell = action.target_cell();
    match action.kind {
        ActionType::Move => {
            if let Some(pos) = target_cell {
                relocate(&mut next, id, pos);
            }
        }
        ActionType::Attack => {
            let target = action
                .target
                .and_then(|t| t.unit_id())
                .filter(|t| t.owner == owner.opponent())
                .and_then(|t| next.unit(t))
                .filter(|t| t.is_alive())
                .cloned();
            if let Some(target) = target {
                let damage = calculate_attack_damage(&target, next.player(target.owner()));
                strike(&mut next, target.id, damage);
            }
        }
        ActionType::PlaceMine => {
            if let Some(pos) = target_cell.filter(|pos| next.mine_at(*pos).is_none()) {
                let kind = action.mine_type.unwrap_or(MineType::Normal);
                next.mines.push(Mine::new(kind, owner, pos));
            }
        }
        ActionType::PlaceTower => {
            let levels = *next.player(owner).levels(UnitType::Minesweeper);
            let limit = if levels.has_variant(Branch::A, Variant::First) { 2 } else { 1 };
            make_room(&mut next, owner, BuildingKind::Tower, limit);
            let mut tower = Building::new(BuildingKind::Tower, owner, unit.pos, levels.a.max(1));
            tower.duration = (levels.a < 2).then_some(2);
            next.buildings.push(tower);
        }
        ActionType::PlaceFactory => {
            let levels = *next.player(owner).levels(UnitType::Maker);
            let limit = if levels.has_variant(Branch::B, Variant::Second) { 2 } else { 1 };
            make_room(&mut next, owner, BuildingKind::Factory, limit);
            next.buildings
                .push(Building::new(BuildingKind::Factory, owner, unit.pos, levels.b.max(1)));
        }
        ActionType::PlaceHub => {
            let level = next.player(owner).levels(unit.kind()).a.max(1);
            next.buildings.retain(|b| !(b.owner == owner && b.kind == BuildingKind::Hub));
            next.buildings.push(Building::new(BuildingKind::Hub, owner, unit.pos, level));
        }
        ActionType::Teleport => {
            let ranger = *next.player(owner).levels(UnitType::Ranger);
            let shared = ranger.has_variant(Branch::A, Variant::Second);
            let own_hop = unit.kind() == UnitType::Ranger && ranger.a >= 2;
            let hub = next.hub_of(owner).map(|h| (h.id, h.pos));
            if let Some((hub_id, hub_pos)) = hub.filter(|_| shared || own_hop) {
                if !next.is_occupied_except(hub_pos, id) {
                    relocate(&mut next, id, hub_pos);
                    if unit.kind() == UnitType::Ranger && !shared {
                        next.buildings.retain(|b| b.id != hub_id);
                    }
                }
            }
        }
        ActionType::DetonateTower => {
            let towers: Vec<Building> = next.buildings_of(owner, BuildingKind::Tower).cloned().collect();
            if !towers.is_empty() {
                let enemy = owner.opponent();
                next.mines
                    .retain(|m| !(m.owner == enemy && towers.iter().any(|t| t.covers(m.pos))));
                let hit: Vec<UnitId> = next
                    .player(enemy)
                    .living_units()
                    .filter(|u| towers.iter().any(|t| t.covers(u.pos)))
                    .map(|u| u.id)
                    .collect();
                for target in hit {
                    strike(&mut next, target, TOWER_BLAST_DAMAGE);
                }
                next.buildings
                    .retain(|b| !(b.owner == owner && b.kind == BuildingKind::Tower));
            }
        }
        ActionType::ThrowMine => {
            if let Some(target) = target_cell.and_then(|pos| living_enemy_at(&next, owner, pos)) {
                strike(&mut next, target, MINE_DAMAGE);
                if let Some(thrower) = next.unit_mut(id) {
                    thrower.carried_mine = None;
                }
            }
        }
        ActionType::PickupMine => {
            if unit.carried_mine.is_none() {
                let idx = target_cell.and_then(|pos| next.mines.iter().position(|m| m.pos == pos));
                if let Some(idx) = idx {
                    let mine = next.mines.remove(idx);
                    if let Some(carrier) = next.unit_mut(id) {
                        carrier.carried_mine = Some(mine);
                    }
                }
            }
        }
        ActionType::DropMine => {
            if let Some(carried) = &unit.carried_mine {
                if !next.is_occupied_except(unit.pos, id) && !next.is_obstacle(unit.pos) {
                    next.mines.push(Mine::new(carried.kind, owner, unit.pos));
                    if let Some(carrier) = next.unit_mut(id) {
                        carrier.carried_mine = None;
                    }
                }
            }
        }
        ActionType::MoveMine => {
            if let (Some(source), Some(dest)) = (action.source_cell, target_cell) {
                project_mine_move(&mut next, owner, source, dest);
            }
        }
        ActionType::ConvertMine => {
            let mine = target_cell.and_then(|pos| next.mines.iter_mut().find(|m| m.owner != owner && m.pos == pos));
            if let Some(mine) = mine {
                mine.owner = owner;
                mine.revealed_to = vec![owner];
                mine.is_converted = true;
            }
        }
        ActionType::Disarm => {
            if let Some(pos) = target_cell {
                let enemy = owner.opponent();
                next.mines.retain(|m| !(m.owner == enemy && m.pos == pos));
            }
        }
        ActionType::PickupFlag => {
            if let Some(carrier) = next.unit_mut(id) {
                carrier.has_flag = true;
            }
        }
        ActionType::DropFlag => {
            if let Some(carrier) = next.unit_mut(id) {
                carrier.has_flag = false;
            }
            next.player_mut(owner).flag_position = unit.pos;
        }
        kind => {
            if let Some((branch, variant)) = kind.evolution() {
                let levels = next.player_mut(owner).evolution_levels.get_mut(unit.kind());
                let level = (levels.level(branch) + 1).min(MAX_EVOLUTION_LEVEL);
                let variant = variant.or(levels.variant(branch));
                levels.set(branch, level, variant);
            }
        }
    }

    next
}

fn project_mine_move(state: &mut GameState, owner: PlayerId, source: Position, dest: Position) {
    let Some(idx) = state.mines.iter().position(|m| m.owner != owner && m.pos == source) else {
        return;
    };
    let shove = state
        .player(owner)
        .levels(UnitType::Defuser)
        .has_variant(Branch::B, Variant::Second);
    if shove {
        if let Some(target) = living_enemy_at(state, owner, dest) {
            strike(state, target, (MINE_DAMAGE as f32 * MINE_SHOVE_RATIO).floor() as i32);
            state.mines.remove(idx);
            return;
        }
    }
    state.mines[idx].pos = dest;
}

/// Greedy choice for `player` on `state`: best unit, then its best action
pub fn best_action<R: Rng + ?Sized>(
    state: &GameState,
    difficulty: Difficulty,
    player: PlayerId,
    tuning: &ProfileTuning,
    rng: &mut R,
) -> Option<CandidateAction> {
    let context = build_planning_context(
        state,
        difficulty,
        player,
        &OpponentModel::initial(),
        None,
        tuning.profile,
    );
    let context = tuning.apply_to_context(context);

    let units = tuning.apply_to_units(generate_unit_candidates(state, difficulty, Some(&context), player, rng));
    let unit = select_best_unit(&units)?;
    let actions = tuning.apply_to_actions(generate_action_candidates(state, &unit.unit, difficulty, Some(&context)));
    select_best_action(&actions)
}

/// Score of the greedy choice, zero when nobody can act
pub fn best_action_score<R: Rng + ?Sized>(
    state: &GameState,
    difficulty: Difficulty,
    player: PlayerId,
    tuning: &ProfileTuning,
    rng: &mut R,
) -> f32 {
    best_action(state, difficulty, player, tuning, rng).map_or(0.0, |a| a.score)
}

/// Rerank `actions` (already sorted) by a one-ply reply and follow-up
///
/// Only the first `beam_count` entries get a `lookahead_score`; the rest
/// compete on their plain score.
pub fn rerank_with_lookahead<R: Rng + ?Sized>(
    state: &GameState,
    actions: Vec<CandidateAction>,
    difficulty: Difficulty,
    ai_player: PlayerId,
    tuning: &ProfileTuning,
    rng: &mut R,
) -> Vec<CandidateAction> {
    let beam = difficulty.beam_count();
    if beam <= 1 || actions.len() <= 1 {
        return actions;
    }

    let counter_weight = difficulty.counter_weight() * tuning.multipliers.lookahead_counter;
    let follow_weight = difficulty.follow_weight() * tuning.multipliers.lookahead_followup;
    let enemy = ai_player.opponent();

    let mut ranked = actions;
    for action in ranked.iter_mut().take(beam) {
        let after_own = project_action(state, action);
        let reply = best_action(&after_own, difficulty, enemy, tuning, rng);
        let counter = reply.as_ref().map_or(0.0, |r| r.score);
        let after_enemy = match &reply {
            Some(reply) => project_action(&after_own, reply),
            None => after_own,
        };
        let follow_up = best_action_score(&after_enemy, difficulty, ai_player, tuning, rng);

        let score = action.score - counter * counter_weight + follow_up * follow_weight;
        debug!(
            action = %action.kind,
            base = action.score,
            counter,
            follow_up,
            lookahead = score,
            "lookahead"
        );
        action.lookahead_score = Some(score);
    }

    ranked.sort_by_key(|a| (Reverse(OrderedFloat(a.ranked_score())), Reverse(OrderedFloat(a.score))));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::tuning::TuningProfile;
    use crate::ai::types::Target;
    use crate::game::state::GameMode;
    use rand::rngs::mock::StepRng;

    fn setup() -> GameState {
        let mut state = GameState::new_match(GameMode::Pve);
        state.current_player = PlayerId::P2;
        state.p1.energy = 60;
        state.p2.energy = 60;
        state
    }

    fn act(owner: PlayerId, kind: UnitType, action: ActionType, target: Option<Target>, cost: i32) -> CandidateAction {
        CandidateAction::new(UnitId::new(owner, kind), action, target, cost)
    }

    fn move_unit(state: &mut GameState, id: UnitId, pos: Position) {
        if let Some(unit) = state.unit_mut(id) {
            unit.pos = pos;
        }
    }

    #[test]
    fn test_projection_charges_energy() {
        let state = setup();
        let action = act(PlayerId::P2, UnitType::Maker, ActionType::Move, Some(Target::cell(Position::new(4, 21))), 3);
        let next = project_action(&state, &action);
        let maker = next.unit(action.unit_id).unwrap();
        assert_eq!(maker.pos, Position::new(4, 21));
        assert_eq!(maker.energy_used_this_turn, 3);
        assert!(maker.has_acted_this_round);
        assert_eq!(next.p2.energy, 57);
        assert_eq!(state.p2.energy, 60);
    }

    #[test]
    fn test_projection_ignores_dead_unit() {
        let mut state = setup();
        let id = UnitId::new(PlayerId::P2, UnitType::Maker);
        state.unit_mut(id).unwrap().is_dead = true;
        let action = act(PlayerId::P2, UnitType::Maker, ActionType::EndTurn, None, 5);
        let next = project_action(&state, &action);
        assert_eq!(next, state);
    }

    #[test]
    fn test_carrier_moves_flag() {
        let mut state = setup();
        let id = UnitId::new(PlayerId::P2, UnitType::General);
        state.unit_mut(id).unwrap().has_flag = true;
        let action = act(PlayerId::P2, UnitType::General, ActionType::Move, Some(Target::cell(Position::new(1, 21))), 4);
        let next = project_action(&state, &action);
        assert_eq!(next.p2.flag_position, Position::new(1, 21));
    }

    #[test]
    fn test_lethal_attack_drops_flag() {
        let mut state = setup();
        let victim = UnitId::new(PlayerId::P1, UnitType::Ranger);
        move_unit(&mut state, victim, Position::new(1, 21));
        {
            let unit = state.unit_mut(victim).unwrap();
            unit.hp = 1;
            unit.has_flag = true;
        }
        let action = act(PlayerId::P2, UnitType::General, ActionType::Attack, Some(Target::unit(victim)), 8);
        let next = project_action(&state, &action);
        let unit = next.unit(victim).unwrap();
        assert!(unit.is_dead);
        assert!(!unit.has_flag);
        assert_eq!(next.p1.flag_position, Position::new(1, 21));
    }

    #[test]
    fn test_tower_limit_replaces_oldest() {
        let mut state = setup();
        state.buildings.push(Building::new(BuildingKind::Tower, PlayerId::P2, Position::new(0, 20), 1));
        let action = act(PlayerId::P2, UnitType::Minesweeper, ActionType::PlaceTower, None, 6);
        let next = project_action(&state, &action);
        let towers: Vec<_> = next.buildings_of(PlayerId::P2, BuildingKind::Tower).collect();
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].pos, Position::new(2, 22));
        assert_eq!(towers[0].duration, Some(2));
    }

    #[test]
    fn test_ranger_teleport_consumes_hub() {
        let mut state = setup();
        state.p2.evolution_levels.ranger.set(Branch::A, 2, None);
        state.buildings.push(Building::new(BuildingKind::Hub, PlayerId::P2, Position::new(3, 15), 2));
        let action = act(PlayerId::P2, UnitType::Ranger, ActionType::Teleport, Some(Target::cell(Position::new(3, 15))), 0);
        let next = project_action(&state, &action);
        assert_eq!(next.unit(action.unit_id).unwrap().pos, Position::new(3, 15));
        assert!(next.hub_of(PlayerId::P2).is_none());
    }

    #[test]
    fn test_detonation_clears_block() {
        let mut state = setup();
        state.buildings.push(Building::new(BuildingKind::Tower, PlayerId::P2, Position::new(3, 12), 3));
        state.mines.push(Mine::new(MineType::Normal, PlayerId::P1, Position::new(4, 13)));
        state.mines.push(Mine::new(MineType::Normal, PlayerId::P1, Position::new(5, 13)));
        let victim = UnitId::new(PlayerId::P1, UnitType::Defuser);
        move_unit(&mut state, victim, Position::new(2, 11));
        let action = act(PlayerId::P2, UnitType::Minesweeper, ActionType::DetonateTower, None, 2);
        let next = project_action(&state, &action);
        assert_eq!(next.mines.len(), 1);
        assert_eq!(next.mines[0].pos, Position::new(5, 13));
        let hurt = next.unit(victim).unwrap();
        assert_eq!(hurt.hp, hurt.max_hp - TOWER_BLAST_DAMAGE);
        assert_eq!(next.buildings_of(PlayerId::P2, BuildingKind::Tower).count(), 0);
    }

    #[test]
    fn test_mine_shove_damages_enemy() {
        let mut state = setup();
        state.p2.evolution_levels.defuser.set(Branch::B, 3, Some(Variant::Second));
        state.mines.push(Mine::new(MineType::Normal, PlayerId::P1, Position::new(5, 20)));
        let victim = UnitId::new(PlayerId::P1, UnitType::Maker);
        move_unit(&mut state, victim, Position::new(5, 21));
        let mut action = act(PlayerId::P2, UnitType::Defuser, ActionType::MoveMine, Some(Target::cell(Position::new(5, 21))), 5);
        action.source_cell = Some(Position::new(5, 20));
        let next = project_action(&state, &action);
        assert!(next.mines.is_empty());
        let hurt = next.unit(victim).unwrap();
        assert_eq!(hurt.hp, hurt.max_hp - 3);
    }

    #[test]
    fn test_convert_and_disarm() {
        let mut state = setup();
        state.mines.push(Mine::new(MineType::Slow, PlayerId::P1, Position::new(5, 21)));
        let convert = act(PlayerId::P2, UnitType::Defuser, ActionType::ConvertMine, Some(Target::cell(Position::new(5, 21))), 5);
        let next = project_action(&state, &convert);
        assert_eq!(next.mines[0].owner, PlayerId::P2);
        assert!(next.mines[0].is_converted);
        assert_eq!(next.mines[0].revealed_to, vec![PlayerId::P2]);

        let disarm = act(PlayerId::P2, UnitType::Defuser, ActionType::Disarm, Some(Target::cell(Position::new(5, 21))), 2);
        assert!(project_action(&state, &disarm).mines.is_empty());
    }

    #[test]
    fn test_evolution_keeps_variant() {
        let mut state = setup();
        state.p2.evolution_levels.maker.set(Branch::B, 2, None);
        let fork = act(PlayerId::P2, UnitType::Maker, ActionType::EvolveB2, None, 30);
        let next = project_action(&state, &fork);
        assert_eq!(next.p2.evolution_levels.maker.b, 3);
        assert_eq!(next.p2.evolution_levels.maker.b_variant, Some(Variant::Second));

        let again = act(PlayerId::P2, UnitType::Maker, ActionType::EvolveB, None, 0);
        let capped = project_action(&next, &again);
        assert_eq!(capped.p2.evolution_levels.maker.b, 3);
        assert_eq!(capped.p2.evolution_levels.maker.b_variant, Some(Variant::Second));
    }

    #[test]
    fn test_easy_skips_lookahead() {
        let state = setup();
        let actions = vec![
            act(PlayerId::P2, UnitType::Maker, ActionType::EndTurn, None, 0),
            act(PlayerId::P2, UnitType::Maker, ActionType::Scan, None, 0),
        ];
        let tuning = ProfileTuning::builtin(TuningProfile::Balanced);
        let mut rng = StepRng::new(1 << 31, 0);
        let ranked = rerank_with_lookahead(&state, actions.clone(), Difficulty::Easy, PlayerId::P2, &tuning, &mut rng);
        assert_eq!(ranked, actions);
    }

    #[test]
    fn test_single_action_untouched() {
        let state = setup();
        let actions = vec![act(PlayerId::P2, UnitType::Maker, ActionType::EndTurn, None, 0)];
        let tuning = ProfileTuning::builtin(TuningProfile::Balanced);
        let mut rng = StepRng::new(1 << 31, 0);
        let ranked = rerank_with_lookahead(&state, actions, Difficulty::Hard, PlayerId::P2, &tuning, &mut rng);
        assert_eq!(ranked[0].lookahead_score, None);
    }
}
