//! Decision diagnostics: why actions were not offered, and what the top of
//! the candidate list looked like

use std::cmp::Reverse;

use crate::core::types::UnitType;
use crate::game::constants::unit_stats;
use crate::game::rules::{
    can_general_attack, check_energy_cap, display_cost, enemy_territory_cost, general_attack_base_cost, CostKind,
};
use crate::game::state::GameState;
use crate::game::units::Unit;

use super::evaluator::cell_risk;
use super::types::{
    ActionType, CandidateAction, CandidateView, PlanningContext, RejectedReason, RejectionKind, RejectionSummary,
    IMPASSABLE_RISK,
};

/// Reasons in first-seen order, merged on (kind, action, detail)
#[derive(Debug, Default)]
struct ReasonLog {
    reasons: Vec<RejectedReason>,
}

impl ReasonLog {
    fn push(&mut self, reason: RejectionKind, action: ActionType, detail: impl Into<String>) {
        let detail = detail.into();
        if let Some(existing) = self
            .reasons
            .iter_mut()
            .find(|r| r.reason == reason && r.action == action && r.detail == detail)
        {
            existing.count += 1;
            return;
        }
        self.reasons.push(RejectedReason { reason, action, detail, count: 1 });
    }

    /// Record an energy shortfall; true when the action is affordable
    fn check_energy(&mut self, state: &GameState, unit: &Unit, action: ActionType, cost: i32) -> bool {
        let energy = state.player(unit.owner()).energy;
        if energy < cost {
            self.push(RejectionKind::Energy, action, format!("need {}, have {}", cost, energy));
            false
        } else if !check_energy_cap(unit, cost) {
            self.push(RejectionKind::Energy, action, "energy cap limit");
            false
        } else {
            true
        }
    }
}

fn movement_rejections(log: &mut ReasonLog, state: &GameState, unit: &Unit, context: &PlanningContext) {
    let cost = display_cost(unit, unit_stats(unit.kind()).move_cost, state, CostKind::Move);
    if !log.check_energy(state, unit, ActionType::Move, cost) {
        return;
    }

    for pos in unit.pos.neighbors() {
        if !GameState::in_bounds(pos) {
            log.push(RejectionKind::Rules, ActionType::Move, "out of bounds");
        } else if state.is_obstacle(pos) {
            log.push(RejectionKind::Rules, ActionType::Move, "blocked by obstacle");
        } else if state.is_occupied_except(pos, unit.id) {
            log.push(RejectionKind::Rules, ActionType::Move, "occupied cell");
        } else if cell_risk(state, unit, pos, Some(&context.threat_map)) >= IMPASSABLE_RISK {
            log.push(RejectionKind::Risk, ActionType::Move, "fatal risk");
        }
    }
}

fn attack_rejections(log: &mut ReasonLog, state: &GameState, unit: &Unit) {
    if unit.kind() != UnitType::General {
        return;
    }
    let targets: Vec<&Unit> = state.player(unit.owner().opponent()).living_units().collect();
    if targets.is_empty() {
        log.push(RejectionKind::Rules, ActionType::Attack, "no enemy targets");
        return;
    }

    let cost = enemy_territory_cost(unit, general_attack_base_cost(unit, state));
    if !log.check_energy(state, unit, ActionType::Attack, cost) {
        return;
    }
    if targets.iter().any(|target| !can_general_attack(unit, target, state)) {
        log.push(RejectionKind::Rules, ActionType::Attack, "out of range or line rules");
    }
}

fn specialist_rejections(log: &mut ReasonLog, state: &GameState, unit: &Unit) {
    let player = state.player(unit.owner());
    match unit.kind() {
        UnitType::Minesweeper => {
            let base = if player.quest_stats.sweeper_scans_this_round >= 2 { 4 } else { 3 };
            log.check_energy(state, unit, ActionType::Scan, enemy_territory_cost(unit, base));

            let level_b = player.levels(UnitType::Minesweeper).b;
            if level_b < 1 {
                log.push(RejectionKind::Rules, ActionType::SensorScan, "not unlocked");
            } else {
                let cost = if level_b >= 3 { 4 } else { 5 };
                log.check_energy(state, unit, ActionType::SensorScan, cost);
            }
        }
        UnitType::Maker => {
            let open = unit
                .pos
                .neighbors()
                .into_iter()
                .any(|pos| !state.is_obstacle(pos) && !state.is_occupied_except(pos, unit.id));
            if !open {
                log.push(RejectionKind::Rules, ActionType::PlaceMine, "no legal adjacent cell");
            }
            log.check_energy(state, unit, ActionType::PlaceMine, enemy_territory_cost(unit, 5));
        }
        UnitType::Defuser => {
            let cost = enemy_territory_cost(unit, unit_stats(UnitType::Defuser).disarm_cost);
            log.check_energy(state, unit, ActionType::Disarm, cost);
            let target = state
                .mines_of(unit.owner().opponent())
                .any(|m| m.pos.chebyshev(&unit.pos) <= 1);
            if !target {
                log.push(RejectionKind::Rules, ActionType::Disarm, "no nearby enemy mine");
            }
        }
        UnitType::General | UnitType::Ranger => {}
    }
}

/// Most frequent rejection reasons for `unit`, at most `limit`
pub fn collect_rejection_summary(
    state: &GameState,
    unit: &Unit,
    context: &PlanningContext,
    limit: usize,
) -> Vec<RejectedReason> {
    let mut log = ReasonLog::default();
    movement_rejections(&mut log, state, unit, context);
    attack_rejections(&mut log, state, unit);
    specialist_rejections(&mut log, state, unit);

    let mut reasons = log.reasons;
    reasons.sort_by_key(|r| Reverse(r.count));
    reasons.truncate(limit);
    reasons
}

pub fn summarize_buckets(reasons: &[RejectedReason]) -> RejectionSummary {
    reasons.iter().fold(RejectionSummary::default(), |mut acc, r| {
        match r.reason {
            RejectionKind::Energy => acc.energy += r.count,
            RejectionKind::Risk => acc.risk += r.count,
            RejectionKind::Rules => acc.rules += r.count,
        }
        acc
    })
}

/// First `limit` actions as ranked views, ranks starting at 1
pub fn summarize_top_candidates(actions: &[CandidateAction], limit: usize) -> Vec<CandidateView> {
    actions
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, action)| CandidateView {
            rank: idx + 1,
            kind: action.kind,
            target: action.target,
            score: action.score,
            lookahead_score: action.lookahead_score,
            is_feint: action.is_feint,
            source_rank: action.source_rank,
            breakdown: action.breakdown.clone(),
        })
        .collect()
}
