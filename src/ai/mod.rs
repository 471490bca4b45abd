//! Heuristic decision engine
//!
//! One module per pipeline stage. `commander` strings them together into a
//! full decision cycle; `executor` is the only stage that touches the live
//! game, and only through the `AiActions` trait.

pub mod commander;
pub mod constraints;
pub mod context;
pub mod diagnostics;
pub mod difficulty;
pub mod endgame;
pub mod evaluator;
pub mod executor;
pub mod generator;
pub mod lookahead;
pub mod opening;
pub mod opponent_model;
pub mod roles;
pub mod selector;
pub mod tuning;
pub mod types;

pub use commander::{should_take_turn, AiCommander, CommanderMemory, Decision};
pub use difficulty::Difficulty;
pub use executor::{action_applied, execute_action, AiActions, RangerAction};
pub use tuning::{load_tuning_profile, ProfileTuning, TuningProfile};
pub use types::{
    ActionType, CandidateAction, CandidateUnit, DecisionInfo, Intent, OpeningPlan, OpponentModel, PlanningContext,
    Role, ScoreBreakdown, Target,
};
