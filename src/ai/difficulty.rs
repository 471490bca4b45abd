//! Difficulty levels and the constant tables behind them

use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::types::ActionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[display(fmt = "easy")]
    Easy,
    #[default]
    #[display(fmt = "normal")]
    Normal,
    #[display(fmt = "hard")]
    Hard,
}

/// Multipliers folded into unit and action totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub unit_attack_opportunity: f32,
    pub unit_flag_pressure: f32,
    pub unit_survival: f32,
    pub unit_energy_efficiency: f32,
    pub action_damage: f32,
    pub action_flag_pressure: f32,
    pub action_safety: f32,
    pub action_utility: f32,
    /// Width of the symmetric noise added to unit priorities
    pub random_jitter: f32,
}

const EASY_WEIGHTS: ScoreWeights = ScoreWeights {
    unit_attack_opportunity: 0.8,
    unit_flag_pressure: 0.7,
    unit_survival: 0.6,
    unit_energy_efficiency: 0.5,
    action_damage: 0.9,
    action_flag_pressure: 0.8,
    action_safety: 0.7,
    action_utility: 0.6,
    random_jitter: 0.8,
};

const NORMAL_WEIGHTS: ScoreWeights = ScoreWeights {
    unit_attack_opportunity: 1.2,
    unit_flag_pressure: 1.0,
    unit_survival: 1.0,
    unit_energy_efficiency: 0.8,
    action_damage: 1.3,
    action_flag_pressure: 1.1,
    action_safety: 1.2,
    action_utility: 1.0,
    random_jitter: 0.4,
};

const HARD_WEIGHTS: ScoreWeights = ScoreWeights {
    unit_attack_opportunity: 1.5,
    unit_flag_pressure: 1.3,
    unit_survival: 1.2,
    unit_energy_efficiency: 1.0,
    action_damage: 1.6,
    action_flag_pressure: 1.3,
    action_safety: 1.5,
    action_utility: 1.2,
    random_jitter: 0.15,
};

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn weights(self) -> &'static ScoreWeights {
        match self {
            Difficulty::Easy => &EASY_WEIGHTS,
            Difficulty::Normal => &NORMAL_WEIGHTS,
            Difficulty::Hard => &HARD_WEIGHTS,
        }
    }

    /// Pause before the AI starts a turn
    pub fn think_delay_ms(self) -> u64 {
        match self {
            Difficulty::Easy => 320,
            Difficulty::Normal => 420,
            Difficulty::Hard => 520,
        }
    }

    pub fn reserve_base(self) -> i32 {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Normal => 6,
            Difficulty::Hard => 8,
        }
    }

    pub fn feint_chance(self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Normal => 0.1,
            Difficulty::Hard => 0.14,
        }
    }

    pub fn feint_max_delta(self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Normal => 2.2,
            Difficulty::Hard => 3.2,
        }
    }

    /// How many top candidates the lookahead reranks
    pub fn beam_count(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 2,
            Difficulty::Hard => 4,
        }
    }

    pub fn counter_weight(self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Normal => 0.25,
            Difficulty::Hard => 0.45,
        }
    }

    pub fn follow_weight(self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Normal => 0.16,
            Difficulty::Hard => 0.32,
        }
    }

    /// How far below the top a non-move may score and still break a move streak
    pub fn move_diversity_delta(self) -> f32 {
        match self {
            Difficulty::Easy => 7.5,
            Difficulty::Normal => 5.5,
            Difficulty::Hard => 4.5,
        }
    }

    pub fn risk_scale(self) -> f32 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.15,
        }
    }
}

/// Animation pacing the scheduler waits after dispatching an action
pub fn action_think_ms(kind: ActionType) -> u64 {
    match kind {
        ActionType::Move => 350,
        ActionType::Attack => 600,
        ActionType::Scan => 700,
        ActionType::SensorScan => 760,
        ActionType::PlaceMine => 800,
        ActionType::PlaceTower | ActionType::PlaceFactory | ActionType::PlaceHub => 760,
        ActionType::Teleport => 620,
        ActionType::DetonateTower => 800,
        ActionType::ThrowMine => 740,
        ActionType::PickupMine | ActionType::DropMine => 500,
        ActionType::MoveMine => 780,
        ActionType::ConvertMine => 760,
        ActionType::Disarm => 650,
        ActionType::EvolveA | ActionType::EvolveB => 520,
        ActionType::EvolveA1 | ActionType::EvolveA2 | ActionType::EvolveB1 | ActionType::EvolveB2 => 560,
        ActionType::PickupFlag => 450,
        ActionType::DropFlag => 550,
        ActionType::EndTurn => 250,
    }
}

/// Pause between choosing and dispatching: the action's pacing plus 60 ms
/// for every runner-up considered, counting at most six
pub fn dispatch_delay_ms(kind: ActionType, candidates: usize) -> u64 {
    action_think_ms(kind) + candidates.saturating_sub(1).min(6) as u64 * 60
}
