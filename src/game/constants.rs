//! Game rule constants - all tunable values in one place
//!
//! Board geometry, unit stats, evolution gates and mine economics.

use crate::core::types::{Position, UnitType};

use super::board::{MineType, OreSize};
use super::state::Branch;

// Board
pub const GRID_ROWS: i32 = 7;
pub const GRID_COLS: i32 = 24;
/// First column of P2's half; P1 units at or beyond it are in enemy territory
pub const TERRITORY_SPLIT_COL: i32 = GRID_COLS / 2;
pub const P1_FLAG_POS: Position = Position::new(3, 0);
pub const P2_FLAG_POS: Position = Position::new(3, 23);

// Energy
pub const INITIAL_ENERGY: i32 = 50;
/// A unit may spend at most this share of its action-start energy per turn
pub const ENERGY_CAP_RATIO: f32 = 0.3333;

// Mines
pub const MAX_MINES_ON_BOARD: usize = 5;
pub const MINE_DAMAGE: i32 = 8;
/// Damage a detonating tower deals to each enemy it covers
pub const TOWER_BLAST_DAMAGE: i32 = 3;
/// A Defuser B3-2 shoving a mine into an enemy deals this share of `MINE_DAMAGE`
pub const MINE_SHOVE_RATIO: f32 = 0.4;

// Evolution (cost indexed by current level)
pub const EVOLUTION_COSTS: [i32; 3] = [10, 20, 30];
pub const MAX_EVOLUTION_LEVEL: u8 = 3;

/// Static per-type stats
#[derive(Debug, Clone, Copy)]
pub struct UnitStats {
    pub max_hp: i32,
    pub move_cost: i32,
    pub attack_cost: i32,
    pub attack_damage: i32,
    pub disarm_cost: i32,
}

const BASE_STATS: UnitStats = UnitStats {
    max_hp: 0,
    move_cost: 3,
    attack_cost: 0,
    attack_damage: 0,
    disarm_cost: 0,
};

pub const fn unit_stats(kind: UnitType) -> UnitStats {
    match kind {
        UnitType::General => UnitStats {
            max_hp: 28,
            attack_cost: 8,
            attack_damage: 4,
            ..BASE_STATS
        },
        UnitType::Minesweeper => UnitStats {
            max_hp: 14,
            ..BASE_STATS
        },
        UnitType::Ranger => UnitStats {
            max_hp: 16,
            move_cost: 2,
            ..BASE_STATS
        },
        UnitType::Maker => UnitStats {
            max_hp: 12,
            ..BASE_STATS
        },
        UnitType::Defuser => UnitStats {
            max_hp: 18,
            disarm_cost: 2,
            ..BASE_STATS
        },
    }
}

/// Quest progress required to reach levels 1, 2 and 3 of a branch
pub const fn evolution_thresholds(kind: UnitType, branch: Branch) -> [i32; 3] {
    match (kind, branch) {
        (UnitType::General, Branch::A) => [4, 12, 20],
        (UnitType::General, Branch::B) => [6, 13, 20],
        (UnitType::Minesweeper, Branch::A) => [2, 5, 8],
        (UnitType::Minesweeper, Branch::B) => [2, 4, 6],
        (UnitType::Ranger, Branch::A) => [8, 18, 28],
        (UnitType::Ranger, Branch::B) => [3, 7, 12],
        (UnitType::Maker, Branch::A) => [2, 5, 8],
        (UnitType::Maker, Branch::B) => [3, 6, 9],
        (UnitType::Defuser, Branch::A) => [2, 5, 8],
        (UnitType::Defuser, Branch::B) => [2, 5, 8],
    }
}

pub const fn mine_base_cost(kind: MineType) -> i32 {
    match kind {
        MineType::Normal => 5,
        MineType::Slow => 4,
        MineType::Smoke => 6,
        MineType::Nuke => 9,
        MineType::Chain => 7,
    }
}

/// Energy granted for stepping onto ore
pub const fn ore_reward(size: OreSize) -> i32 {
    match size {
        OreSize::Small => 4,
        OreSize::Medium => 7,
        OreSize::Large => 10,
    }
}
