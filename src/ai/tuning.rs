//! Tuning profiles - personality biases layered over raw scores
//!
//! Each profile adds linear corrections to the score breakdown terms and
//! shifts the energy reserve. Built-in values can be overridden from
//! `data/ai_profiles/{name}.toml`; missing keys keep the built-in value.

use std::fs;
use std::path::{Path, PathBuf};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{EngineError, Result};

use super::types::{CandidateAction, CandidateUnit, PlanningContext, ScoreBreakdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TuningProfile {
    #[display(fmt = "aggressive")]
    Aggressive,
    #[default]
    #[display(fmt = "balanced")]
    Balanced,
    #[display(fmt = "conservative")]
    Conservative,
}

impl TuningProfile {
    pub const ALL: [TuningProfile; 3] = [
        TuningProfile::Aggressive,
        TuningProfile::Balanced,
        TuningProfile::Conservative,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == name)
            .ok_or_else(|| EngineError::UnknownProfile(name.to_string()))
    }
}

/// Biases applied to unit priority terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitBias {
    pub attack: f32,
    pub flag: f32,
    pub safety: f32,
    pub energy: f32,
}

/// Biases applied to action score terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionBias {
    pub attack: f32,
    pub flag: f32,
    pub safety: f32,
    pub utility: f32,
    pub energy: f32,
}

/// Scales applied on top of the difficulty's lookahead and feint tables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub lookahead_counter: f32,
    pub lookahead_followup: f32,
    pub feint_chance: f32,
    pub feint_max_delta: f32,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            lookahead_counter: 1.0,
            lookahead_followup: 1.0,
            feint_chance: 1.0,
            feint_max_delta: 1.0,
        }
    }
}

/// Complete tuning for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTuning {
    /// Which profile these values belong to (set by the loader)
    #[serde(skip)]
    pub profile: TuningProfile,
    pub label: String,

    // === UNIT PRIORITY ===
    #[serde(default)]
    pub unit: UnitBias,

    // === ACTION SCORES ===
    #[serde(default)]
    pub action: ActionBias,

    // === ENERGY ===
    /// Added to the reserve, result floored at zero
    #[serde(default)]
    pub reserve_energy_delta: i32,

    // === LOOKAHEAD / FEINTS ===
    #[serde(default)]
    pub multipliers: Multipliers,
}

impl ProfileTuning {
    pub fn builtin(profile: TuningProfile) -> Self {
        match profile {
            TuningProfile::Aggressive => Self {
                profile,
                label: "Aggressive".to_string(),
                unit: UnitBias { attack: 1.8, flag: 1.1, safety: -1.1, energy: -0.2 },
                action: ActionBias { attack: 2.4, flag: 1.2, safety: -1.5, utility: 0.4, energy: -0.2 },
                reserve_energy_delta: -2,
                multipliers: Multipliers {
                    lookahead_counter: 0.85,
                    lookahead_followup: 1.2,
                    feint_chance: 1.2,
                    feint_max_delta: 1.2,
                },
            },
            TuningProfile::Balanced => Self {
                profile,
                label: "Balanced".to_string(),
                unit: UnitBias::default(),
                action: ActionBias::default(),
                reserve_energy_delta: 0,
                multipliers: Multipliers::default(),
            },
            TuningProfile::Conservative => Self {
                profile,
                label: "Conservative".to_string(),
                unit: UnitBias { attack: -0.8, flag: -0.2, safety: 1.7, energy: 0.8 },
                action: ActionBias { attack: -1.1, flag: -0.3, safety: 2.3, utility: 0.6, energy: 0.8 },
                reserve_energy_delta: 2,
                multipliers: Multipliers {
                    lookahead_counter: 1.25,
                    lookahead_followup: 0.9,
                    feint_chance: 0.7,
                    feint_max_delta: 0.75,
                },
            },
        }
    }

    /// True when the score biases are all zero
    pub fn is_identity(&self) -> bool {
        self.unit == UnitBias::default() && self.action == ActionBias::default()
    }

    /// Load `name` from the profile directory, falling back to the built-in
    /// values when the file is missing or malformed
    pub fn load_or_builtin(profile: TuningProfile) -> Self {
        match load_tuning_profile(&profile.to_string()) {
            Ok(tuning) => tuning,
            Err(e) => {
                warn!(profile = %profile, error = %e, "using built-in tuning profile");
                Self::builtin(profile)
            }
        }
    }

    fn unit_delta(&self, b: &ScoreBreakdown) -> f32 {
        b.attack_or_zero() * self.unit.attack
            + b.flag_or_zero() * self.unit.flag
            + b.safety_or_zero() * self.unit.safety
            + b.energy_or_zero() * self.unit.energy
    }

    fn action_delta(&self, b: &ScoreBreakdown) -> f32 {
        b.attack_or_zero() * self.action.attack
            + b.flag_or_zero() * self.action.flag
            + b.safety_or_zero() * self.action.safety
            + b.utility_or_zero() * self.action.utility
            + b.energy_or_zero() * self.action.energy
    }

    /// Retune unit candidates; identity profiles hand back the same vector
    pub fn apply_to_units(&self, mut candidates: Vec<CandidateUnit>) -> Vec<CandidateUnit> {
        if self.is_identity() {
            return candidates;
        }
        for candidate in &mut candidates {
            candidate.score += self.unit_delta(&candidate.breakdown);
            candidate.breakdown.total = candidate.score;
        }
        candidates
    }

    /// Retune action candidates; identity profiles hand back the same vector
    pub fn apply_to_actions(&self, mut candidates: Vec<CandidateAction>) -> Vec<CandidateAction> {
        if self.is_identity() {
            return candidates;
        }
        for action in &mut candidates {
            action.score += self.action_delta(&action.breakdown);
            action.breakdown.total = action.score;
        }
        candidates
    }

    pub fn apply_to_context(&self, context: PlanningContext) -> PlanningContext {
        if self.reserve_energy_delta == 0 {
            return context;
        }
        PlanningContext {
            reserve_energy: (context.reserve_energy + self.reserve_energy_delta).max(0),
            ..context
        }
    }
}

/// Load a profile from `data/ai_profiles/{name}.toml` over its built-in values
pub fn load_tuning_profile(name: &str) -> Result<ProfileTuning> {
    load_tuning_profile_from(Path::new("data/ai_profiles"), name)
}

pub fn load_tuning_profile_from(dir: &Path, name: &str) -> Result<ProfileTuning> {
    let profile = TuningProfile::from_name(name)?;
    let contents = fs::read_to_string(profile_path(dir, name))?;
    let overrides: toml::Value = toml::from_str(&contents)?;

    let mut merged = toml::Value::try_from(ProfileTuning::builtin(profile))
        .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
    merge_toml(&mut merged, overrides);

    let mut tuning: ProfileTuning = merged.try_into()?;
    tuning.profile = profile;
    Ok(tuning)
}

fn profile_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.toml", name))
}

fn merge_toml(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_toml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
