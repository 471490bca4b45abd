//! Value types shared by every stage of the decision pipeline

use ahash::AHashMap;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{Position, UnitId};
use crate::game::board::{MineType, Variant};
use crate::game::state::Branch;
use crate::game::units::Unit;

/// Every action the engine can choose for a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[display(fmt = "move")]
    Move,
    #[display(fmt = "attack")]
    Attack,
    #[display(fmt = "scan")]
    Scan,
    #[display(fmt = "sensor_scan")]
    SensorScan,
    #[display(fmt = "place_mine")]
    PlaceMine,
    #[display(fmt = "place_tower")]
    PlaceTower,
    #[display(fmt = "place_factory")]
    PlaceFactory,
    #[display(fmt = "place_hub")]
    PlaceHub,
    #[display(fmt = "teleport")]
    Teleport,
    #[display(fmt = "detonate_tower")]
    DetonateTower,
    #[display(fmt = "throw_mine")]
    ThrowMine,
    #[display(fmt = "pickup_mine")]
    PickupMine,
    #[display(fmt = "drop_mine")]
    DropMine,
    #[display(fmt = "move_mine")]
    MoveMine,
    #[display(fmt = "convert_mine")]
    ConvertMine,
    #[display(fmt = "disarm")]
    Disarm,
    #[display(fmt = "evolve_a")]
    EvolveA,
    #[serde(rename = "evolve_a_1")]
    #[display(fmt = "evolve_a_1")]
    EvolveA1,
    #[serde(rename = "evolve_a_2")]
    #[display(fmt = "evolve_a_2")]
    EvolveA2,
    #[display(fmt = "evolve_b")]
    EvolveB,
    #[serde(rename = "evolve_b_1")]
    #[display(fmt = "evolve_b_1")]
    EvolveB1,
    #[serde(rename = "evolve_b_2")]
    #[display(fmt = "evolve_b_2")]
    EvolveB2,
    #[display(fmt = "pickup_flag")]
    PickupFlag,
    #[display(fmt = "drop_flag")]
    DropFlag,
    #[display(fmt = "end_turn")]
    EndTurn,
}

impl ActionType {
    /// Evolution action for a branch, with the level-3 fork when given
    pub fn evolve(branch: Branch, variant: Option<Variant>) -> Self {
        match (branch, variant) {
            (Branch::A, None) => ActionType::EvolveA,
            (Branch::A, Some(Variant::First)) => ActionType::EvolveA1,
            (Branch::A, Some(Variant::Second)) => ActionType::EvolveA2,
            (Branch::B, None) => ActionType::EvolveB,
            (Branch::B, Some(Variant::First)) => ActionType::EvolveB1,
            (Branch::B, Some(Variant::Second)) => ActionType::EvolveB2,
        }
    }

    /// Branch and fork of an evolution action
    pub fn evolution(self) -> Option<(Branch, Option<Variant>)> {
        match self {
            ActionType::EvolveA => Some((Branch::A, None)),
            ActionType::EvolveA1 => Some((Branch::A, Some(Variant::First))),
            ActionType::EvolveA2 => Some((Branch::A, Some(Variant::Second))),
            ActionType::EvolveB => Some((Branch::B, None)),
            ActionType::EvolveB1 => Some((Branch::B, Some(Variant::First))),
            ActionType::EvolveB2 => Some((Branch::B, Some(Variant::Second))),
            _ => None,
        }
    }

    pub fn is_evolution(self) -> bool {
        self.evolution().is_some()
    }
}

/// Side-wide goal for the current decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[display(fmt = "push_flag")]
    PushFlag,
    #[display(fmt = "hunt_flag_carrier")]
    HuntFlagCarrier,
    #[display(fmt = "control_mines")]
    ControlMines,
    #[display(fmt = "stabilize")]
    Stabilize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[display(fmt = "striker")]
    Striker,
    #[display(fmt = "flanker")]
    Flanker,
    #[display(fmt = "controller")]
    Controller,
    #[display(fmt = "scout")]
    Scout,
    #[display(fmt = "support")]
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OpeningPlan {
    #[display(fmt = "center_break")]
    CenterBreak,
    #[display(fmt = "lane_pressure")]
    LanePressure,
    #[display(fmt = "mine_screen")]
    MineScreen,
    #[display(fmt = "scout_probe")]
    ScoutProbe,
    #[display(fmt = "fortress")]
    Fortress,
    #[display(fmt = "flag_spear")]
    FlagSpear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum EndgameMode {
    #[display(fmt = "none")]
    None,
    #[display(fmt = "race")]
    Race,
    #[display(fmt = "defense")]
    Defense,
    #[display(fmt = "attrition")]
    Attrition,
}

/// Per-term score contributions; absent terms read as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f32>,
}

impl ScoreBreakdown {
    pub fn attack_or_zero(&self) -> f32 {
        self.attack.unwrap_or(0.0)
    }

    pub fn flag_or_zero(&self) -> f32 {
        self.flag.unwrap_or(0.0)
    }

    pub fn safety_or_zero(&self) -> f32 {
        self.safety.unwrap_or(0.0)
    }

    pub fn utility_or_zero(&self) -> f32 {
        self.utility.unwrap_or(0.0)
    }

    pub fn energy_or_zero(&self) -> f32 {
        self.energy.unwrap_or(0.0)
    }
}

/// What an action points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Cell { pos: Position },
    Unit { id: UnitId },
    MineType { mine_type: MineType },
}

impl Target {
    pub fn cell(pos: Position) -> Self {
        Target::Cell { pos }
    }

    pub fn unit(id: UnitId) -> Self {
        Target::Unit { id }
    }

    pub fn cell_pos(&self) -> Option<Position> {
        match self {
            Target::Cell { pos } => Some(*pos),
            _ => None,
        }
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        match self {
            Target::Unit { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateUnit {
    pub unit: Unit,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub unit_id: UnitId,
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_cell: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_type: Option<MineType>,
    pub energy_cost: i32,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead_score: Option<f32>,
    #[serde(default)]
    pub is_feint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rank: Option<usize>,
    pub breakdown: ScoreBreakdown,
}

impl CandidateAction {
    pub fn new(unit_id: UnitId, kind: ActionType, target: Option<Target>, energy_cost: i32) -> Self {
        Self {
            unit_id,
            kind,
            target,
            source_cell: None,
            mine_type: None,
            energy_cost,
            score: 0.0,
            lookahead_score: None,
            is_feint: false,
            source_rank: None,
            breakdown: ScoreBreakdown::default(),
        }
    }

    /// Score used for the final ranking
    pub fn ranked_score(&self) -> f32 {
        self.lookahead_score.unwrap_or(self.score)
    }

    pub fn target_cell(&self) -> Option<Position> {
        self.target.and_then(|t| t.cell_pos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    #[display(fmt = "energy")]
    Energy,
    #[display(fmt = "risk")]
    Risk,
    #[display(fmt = "rules")]
    Rules,
}

/// Why an action type was not offered, with how often the reason came up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedReason {
    pub reason: RejectionKind,
    pub action: ActionType,
    pub detail: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionSummary {
    pub energy: u32,
    pub risk: u32,
    pub rules: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateView {
    pub rank: usize,
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead_score: Option<f32>,
    #[serde(default)]
    pub is_feint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rank: Option<usize>,
    pub breakdown: ScoreBreakdown,
}

/// Operator-facing explanation of one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionInfo {
    pub unit_id: UnitId,
    pub action: ActionType,
    pub target: Option<Target>,
    pub mine_type: Option<MineType>,
    pub score: f32,
    pub lookahead_score: Option<f32>,
    pub intent: Intent,
    pub role: Option<Role>,
    pub tuning_profile: super::tuning::TuningProfile,
    pub opening_plan: Option<OpeningPlan>,
    pub endgame_mode: EndgameMode,
    pub endgame_urgency: f32,
    pub opponent_aggression: f32,
    pub opponent_flag_rush: f32,
    pub opponent_mine_pressure: f32,
    pub is_feint: bool,
    pub source_rank: Option<usize>,
    pub breakdown: ScoreBreakdown,
    pub raw_top_candidates: Vec<CandidateView>,
    pub final_top_candidates: Vec<CandidateView>,
    pub rejected_reasons: Vec<RejectedReason>,
    pub rejected_summary: RejectionSummary,
}

/// Risk per cell, 999 and above means never step there
pub type ThreatMap = Vec<Vec<f32>>;

pub const IMPASSABLE_RISK: f32 = 999.0;

/// Decaying picture of how the opponent has been playing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentModel {
    pub aggression: f32,
    pub flag_rush: f32,
    pub mine_pressure: f32,
    #[serde(with = "hotspot_keys")]
    pub hotspots: AHashMap<Position, f32>,
    pub samples: u32,
}

mod hotspot_keys {
    use ahash::AHashMap;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::core::types::Position;

    pub fn serialize<S: Serializer>(map: &AHashMap<Position, f32>, serializer: S) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, f32> = map.iter().map(|(pos, w)| (pos.to_string(), *w)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AHashMap<Position, f32>, D::Error> {
        let keyed = BTreeMap::<String, f32>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(key, w)| {
                Position::parse_key(&key)
                    .map(|pos| (pos, w))
                    .ok_or_else(|| D::Error::custom(format!("bad hotspot key '{key}'")))
            })
            .collect()
    }
}

mod role_pairs {
    use ahash::AHashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Role;
    use crate::core::types::UnitId;

    pub fn serialize<S: Serializer>(map: &AHashMap<UnitId, Role>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pairs: Vec<(UnitId, Role)> = map.iter().map(|(id, role)| (*id, *role)).collect();
        pairs.sort_by_key(|(id, _)| *id);
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AHashMap<UnitId, Role>, D::Error> {
        let pairs = Vec::<(UnitId, Role)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotCell {
    pub pos: Position,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningState {
    pub is_opening: bool,
    pub plan: Option<OpeningPlan>,
    pub weight: f32,
    pub turn: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndgameState {
    pub is_endgame: bool,
    pub mode: EndgameMode,
    pub urgency: f32,
    pub own_alive: usize,
    pub enemy_alive: usize,
}

/// Everything one decision cycle derives up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    pub intent: Intent,
    pub threat_map: ThreatMap,
    pub reserve_energy: i32,
    #[serde(with = "role_pairs")]
    pub unit_roles: AHashMap<UnitId, Role>,
    pub opponent_model: OpponentModel,
    pub hotspot_cells: Vec<HotspotCell>,
    pub opening: OpeningState,
    pub endgame: EndgameState,
}

impl PlanningContext {
    pub fn role_of(&self, id: UnitId) -> Option<Role> {
        self.unit_roles.get(&id).copied()
    }

    pub fn risk_at(&self, pos: Position) -> Option<f32> {
        if pos.r < 0 || pos.c < 0 {
            return None;
        }
        self.threat_map.get(pos.r as usize)?.get(pos.c as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PlayerId;

    #[test]
    fn test_action_names_match_display() {
        assert_eq!(ActionType::SensorScan.to_string(), "sensor_scan");
        assert_eq!(ActionType::EvolveB2.to_string(), "evolve_b_2");
        let json = serde_json::to_string(&ActionType::EvolveA1).unwrap();
        assert_eq!(json, "\"evolve_a_1\"");
    }

    #[test]
    fn test_evolve_round_trips_branch_and_variant() {
        for branch in [Branch::A, Branch::B] {
            for variant in [None, Some(Variant::First), Some(Variant::Second)] {
                let action = ActionType::evolve(branch, variant);
                assert_eq!(action.evolution(), Some((branch, variant)));
            }
        }
        assert!(!ActionType::Move.is_evolution());
    }

    #[test]
    fn test_missing_breakdown_terms_are_zero() {
        let breakdown = ScoreBreakdown { total: 3.0, attack: Some(2.0), ..Default::default() };
        assert_eq!(breakdown.attack_or_zero(), 2.0);
        assert_eq!(breakdown.utility_or_zero(), 0.0);
    }

    #[test]
    fn test_hotspots_serialize_as_string_keys() {
        let mut model = OpponentModel::default();
        model.hotspots.insert(Position::new(2, 14), 1.2);
        let json = serde_json::to_value(&model).unwrap();
        assert!(json["hotspots"]["2,14"].is_number());

        let back: OpponentModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.hotspots.get(&Position::new(2, 14)), Some(&1.2));
    }

    #[test]
    fn test_target_accessors() {
        let id = UnitId::new(PlayerId::P1, crate::core::types::UnitType::Maker);
        assert_eq!(Target::unit(id).unit_id(), Some(id));
        assert_eq!(Target::unit(id).cell_pos(), None);
    }
}
