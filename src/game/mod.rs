//! Game model the decision engine reads
//!
//! State snapshot, board contents, units, rule constants and the rule
//! helpers used for cost and legality checks.

pub mod board;
pub mod constants;
pub mod rules;
pub mod state;
pub mod units;

pub use board::{Building, BuildingKind, Cell, Mine, MineType, OreSize, Variant};
pub use state::{Branch, BranchLevels, GameMode, GameState, Movement, Phase, PlayerState, QuestStats};
pub use units::{Unit, UnitStatus};
