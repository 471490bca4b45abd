//! Flagfront - heuristic AI for a turn-based mine-and-flag tactics game
//!
//! `game` holds the state model and the rule helpers the engine consults.
//! `ai` is the decision pipeline. `core` carries shared ids, errors and
//! scheduler configuration.

pub mod ai;
pub mod core;
pub mod game;
