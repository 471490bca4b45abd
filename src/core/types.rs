//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum PlayerId {
    #[display(fmt = "P1")]
    P1,
    #[display(fmt = "P2")]
    P2,
}

impl PlayerId {
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::P1 => PlayerId::P2,
            PlayerId::P2 => PlayerId::P1,
        }
    }

    pub const ALL: [PlayerId; 2] = [PlayerId::P1, PlayerId::P2];
}

/// The five unit types each side fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[display(fmt = "general")]
    General,
    #[display(fmt = "minesweeper")]
    Minesweeper,
    #[display(fmt = "ranger")]
    Ranger,
    #[display(fmt = "maker")]
    Maker,
    #[display(fmt = "defuser")]
    Defuser,
}

impl UnitType {
    pub const ALL: [UnitType; 5] = [
        UnitType::General,
        UnitType::Minesweeper,
        UnitType::Ranger,
        UnitType::Maker,
        UnitType::Defuser,
    ];
}

/// Unit identifier
///
/// Each side owns exactly one unit per type, so the pair is unique for the
/// whole match (death and respawn reuse the same id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display(fmt = "{}-{}", owner, kind)]
pub struct UnitId {
    pub owner: PlayerId,
    pub kind: UnitType,
}

impl UnitId {
    pub fn new(owner: PlayerId, kind: UnitType) -> Self {
        Self { owner, kind }
    }
}

/// Grid coordinate (row, column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display(fmt = "{},{}", r, c)]
pub struct Position {
    pub r: i32,
    pub c: i32,
}

impl Position {
    pub const fn new(r: i32, c: i32) -> Self {
        Self { r, c }
    }

    pub fn manhattan(&self, other: &Self) -> i32 {
        (self.r - other.r).abs() + (self.c - other.c).abs()
    }

    pub fn chebyshev(&self, other: &Self) -> i32 {
        (self.r - other.r).abs().max((self.c - other.c).abs())
    }

    pub fn offset(&self, dr: i32, dc: i32) -> Self {
        Self::new(self.r + dr, self.c + dc)
    }

    /// Orthogonal neighbours in up, down, left, right order (may be off-board)
    pub fn neighbors(&self) -> [Position; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// True when both cells share a row or a column
    pub fn is_cardinal_to(&self, other: &Self) -> bool {
        self.r == other.r || self.c == other.c
    }

    /// Parse the `"r,c"` key form produced by `Display`
    pub fn parse_key(key: &str) -> Option<Self> {
        let (r, c) = key.split_once(',')?;
        Some(Self::new(r.trim().parse().ok()?, c.trim().parse().ok()?))
    }
}

/// Unique identifier for mines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MineId(pub Uuid);

impl MineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for buildings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub Uuid);

impl BuildingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BuildingId {
    fn default() -> Self {
        Self::new()
    }
}
