//! Board contents: cells, mines and buildings

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, MineId, PlayerId, Position};

/// Energy ore deposit size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OreSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub is_obstacle: bool,
    #[serde(default)]
    pub ore: Option<OreSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum MineType {
    #[display(fmt = "normal")]
    Normal,
    #[display(fmt = "slow")]
    Slow,
    #[display(fmt = "smoke")]
    Smoke,
    #[display(fmt = "nuke")]
    Nuke,
    #[display(fmt = "chain")]
    Chain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mine {
    #[serde(default)]
    pub id: MineId,
    pub kind: MineType,
    pub owner: PlayerId,
    pub pos: Position,
    /// Players that can see this mine (the owner always can)
    #[serde(default)]
    pub revealed_to: Vec<PlayerId>,
    #[serde(default)]
    pub is_converted: bool,
}

impl Mine {
    pub fn new(kind: MineType, owner: PlayerId, pos: Position) -> Self {
        Self {
            id: MineId::new(),
            kind,
            owner,
            pos,
            revealed_to: vec![owner],
            is_converted: false,
        }
    }

    pub fn is_visible_to(&self, player: PlayerId) -> bool {
        self.owner == player || self.revealed_to.contains(&player)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    #[display(fmt = "tower")]
    Tower,
    #[display(fmt = "factory")]
    Factory,
    #[display(fmt = "hub")]
    Hub,
}

/// Level-3 fork of an evolution branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
}

impl Variant {
    pub fn number(self) -> u8 {
        match self {
            Variant::First => 1,
            Variant::Second => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(default)]
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub owner: PlayerId,
    pub pos: Position,
    pub level: u8,
    #[serde(default)]
    pub variant: Option<Variant>,
    /// Rounds left before a temporary building expires
    #[serde(default)]
    pub duration: Option<u32>,
}

impl Building {
    pub fn new(kind: BuildingKind, owner: PlayerId, pos: Position, level: u8) -> Self {
        Self {
            id: BuildingId::new(),
            kind,
            owner,
            pos,
            level,
            variant: None,
            duration: None,
        }
    }

    /// Towers and detonations reach the 3x3 block around the building
    pub fn covers(&self, pos: Position) -> bool {
        self.pos.chebyshev(&pos) <= 1
    }
}
