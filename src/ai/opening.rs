//! Opening book
//!
//! Six named plans. Each biases action types and roles during the first
//! turns and pulls moves toward a preferred lane of the board.

use crate::core::types::{PlayerId, Position, UnitType};
use crate::game::board::MineType;
use crate::game::constants::{GRID_COLS, GRID_ROWS};
use crate::game::state::GameState;
use crate::game::units::Unit;

use super::difficulty::Difficulty;
use super::tuning::TuningProfile;
use super::types::{ActionType, OpeningPlan, OpponentModel, PlanningContext, Role};

/// Where on the board a plan wants its units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Center,
    Upper,
    Lower,
    Wide,
    Fortress,
}

struct BookEntry {
    action_bias: &'static [(ActionType, f32)],
    role_bias: &'static [(Role, f32)],
    lane: Lane,
}

impl BookEntry {
    fn action(&self, kind: ActionType) -> f32 {
        self.action_bias
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    fn role(&self, role: Role) -> f32 {
        self.role_bias
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

fn book(plan: OpeningPlan) -> BookEntry {
    use ActionType::*;
    match plan {
        OpeningPlan::CenterBreak => BookEntry {
            action_bias: &[(Move, 2.2), (Attack, 1.1), (Scan, 0.8), (Teleport, 0.9)],
            role_bias: &[(Role::Striker, 1.5), (Role::Flanker, 1.1)],
            lane: Lane::Center,
        },
        OpeningPlan::LanePressure => BookEntry {
            action_bias: &[(Move, 2.4), (Attack, 0.8), (PickupFlag, 0.7)],
            role_bias: &[(Role::Flanker, 1.5), (Role::Striker, 1.1)],
            lane: Lane::Wide,
        },
        OpeningPlan::MineScreen => BookEntry {
            action_bias: &[
                (PlaceMine, 2.8),
                (PlaceTower, 1.6),
                (MoveMine, 1.3),
                (ConvertMine, 1.4),
                (Scan, 1.3),
                (Disarm, 0.8),
                (Move, 0.6),
            ],
            role_bias: &[(Role::Controller, 1.6), (Role::Support, 1.1)],
            lane: Lane::Center,
        },
        OpeningPlan::ScoutProbe => BookEntry {
            action_bias: &[(Scan, 2.7), (Move, 1.6), (Disarm, 1.2)],
            role_bias: &[(Role::Scout, 1.8), (Role::Support, 0.9)],
            lane: Lane::Upper,
        },
        OpeningPlan::Fortress => BookEntry {
            action_bias: &[
                (PlaceMine, 1.9),
                (PlaceTower, 1.5),
                (PlaceHub, 1.2),
                (Disarm, 1.4),
                (Move, 0.4),
                (EndTurn, 0.3),
            ],
            role_bias: &[(Role::Support, 1.5), (Role::Controller, 1.2)],
            lane: Lane::Fortress,
        },
        OpeningPlan::FlagSpear => BookEntry {
            action_bias: &[(Move, 2.5), (PickupFlag, 1.1), (Attack, 1.4)],
            role_bias: &[(Role::Striker, 1.7), (Role::Flanker, 1.2)],
            lane: Lane::Lower,
        },
    }
}

/// Obstacles in the four middle columns
pub fn center_obstacle_count(state: &GameState) -> usize {
    let start = GRID_COLS / 2 - 2;
    let end = GRID_COLS / 2 + 1;
    (0..GRID_ROWS)
        .flat_map(|r| (start..=end).map(move |c| Position::new(r, c)))
        .filter(|pos| state.is_obstacle(*pos))
        .count()
}

pub fn choose_opening_plan(
    state: &GameState,
    difficulty: Difficulty,
    profile: TuningProfile,
    model: &OpponentModel,
    ai_player: PlayerId,
) -> OpeningPlan {
    let own_flag = state.player(ai_player).flag_position;
    let center_obstacles = center_obstacle_count(state);
    let forward_pressure = state
        .player(ai_player.opponent())
        .living_units()
        .filter(|u| u.pos.manhattan(&own_flag) <= 7)
        .count();

    if model.mine_pressure >= 4.5 {
        return OpeningPlan::ScoutProbe;
    }
    match profile {
        TuningProfile::Conservative => {
            return if forward_pressure >= 2 {
                OpeningPlan::Fortress
            } else {
                OpeningPlan::MineScreen
            };
        }
        TuningProfile::Aggressive => {
            return if center_obstacles <= 5 {
                OpeningPlan::CenterBreak
            } else {
                OpeningPlan::FlagSpear
            };
        }
        TuningProfile::Balanced => {}
    }

    if difficulty == Difficulty::Hard && center_obstacles <= 4 {
        OpeningPlan::CenterBreak
    } else if forward_pressure >= 2 || model.flag_rush >= 4.2 || center_obstacles >= 8 {
        OpeningPlan::LanePressure
    } else {
        OpeningPlan::MineScreen
    }
}

fn lane_score(lane: Lane, target: Position, unit: &Unit) -> f32 {
    let r = target.r as f32;
    let c = target.c as f32;
    match lane {
        Lane::Center => {
            let center_r = (GRID_ROWS / 2) as f32;
            let center_c = (GRID_COLS / 2) as f32;
            (4.0 - ((r - center_r).abs() * 0.7 + (c - center_c).abs() * 0.18)).clamp(0.0, 4.0)
        }
        Lane::Upper => (3.8 - r * 0.9).clamp(0.0, 3.8),
        Lane::Lower => (3.8 - ((GRID_ROWS - 1) as f32 - r) * 0.9).clamp(0.0, 3.8),
        Lane::Fortress => {
            let backline = match unit.owner() {
                PlayerId::P2 => GRID_COLS - 3,
                PlayerId::P1 => 2,
            };
            (4.2 - (target.c - backline).abs() as f32 * 0.45).clamp(0.0, 4.2)
        }
        Lane::Wide => {
            let edge = target.r.min(GRID_ROWS - 1 - target.r) as f32;
            (3.4 - edge * 0.9).clamp(0.0, 3.4)
        }
    }
}

/// Early-game bias for one candidate, zero outside the opening window
pub fn opening_action_bias(
    context: &PlanningContext,
    unit: &Unit,
    kind: ActionType,
    target: Option<Position>,
    mine_type: Option<MineType>,
) -> f32 {
    let Some(plan) = context.opening.plan.filter(|_| context.opening.is_opening) else {
        return 0.0;
    };
    let entry = book(plan);

    let mut bonus = entry.action(kind);
    if let Some(role) = context.role_of(unit.id) {
        bonus += entry.role(role);
    }

    if let Some(target) = target {
        bonus += lane_score(entry.lane, target, unit) * 0.65;
        if kind == ActionType::Move {
            let forward = match unit.owner() {
                PlayerId::P2 => unit.pos.c - target.c,
                PlayerId::P1 => target.c - unit.pos.c,
            };
            if forward > 0 {
                bonus += forward as f32 * 0.55;
            }
        }
    }

    if kind == ActionType::PlaceMine {
        if plan == OpeningPlan::MineScreen && mine_type == Some(MineType::Chain) {
            bonus += 1.2;
        }
        if plan == OpeningPlan::Fortress && matches!(mine_type, Some(MineType::Normal | MineType::Slow)) {
            bonus += 0.9;
        }
    }

    if plan == OpeningPlan::FlagSpear && unit.kind() == UnitType::General && kind == ActionType::PickupFlag {
        bonus += 1.3;
    }

    bonus * context.opening.weight
}
