//! Match state snapshot
//!
//! The decision engine only reads this. Real mutation belongs to the rule
//! engine behind `AiActions`; the lookahead works on clones.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::{PlayerId, Position, UnitId, UnitType};

use super::board::{Building, BuildingKind, Cell, Mine, OreSize, Variant};
use super::constants::{GRID_COLS, GRID_ROWS, INITIAL_ENERGY, P1_FLAG_POS, P2_FLAG_POS};
use super::units::Unit;

/// Evolution branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "a")]
    A,
    #[serde(rename = "b")]
    B,
}

/// Level and chosen variant of both branches for one unit type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLevels {
    pub a: u8,
    pub b: u8,
    #[serde(default)]
    pub a_variant: Option<Variant>,
    #[serde(default)]
    pub b_variant: Option<Variant>,
}

impl BranchLevels {
    pub fn level(&self, branch: Branch) -> u8 {
        match branch {
            Branch::A => self.a,
            Branch::B => self.b,
        }
    }

    pub fn variant(&self, branch: Branch) -> Option<Variant> {
        match branch {
            Branch::A => self.a_variant,
            Branch::B => self.b_variant,
        }
    }

    /// Level 3 with the given fork
    pub fn has_variant(&self, branch: Branch, variant: Variant) -> bool {
        self.level(branch) >= 3 && self.variant(branch) == Some(variant)
    }

    pub fn set(&mut self, branch: Branch, level: u8, variant: Option<Variant>) {
        match branch {
            Branch::A => {
                self.a = level;
                self.a_variant = variant;
            }
            Branch::B => {
                self.b = level;
                self.b_variant = variant;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionLevels {
    pub general: BranchLevels,
    pub minesweeper: BranchLevels,
    pub ranger: BranchLevels,
    pub maker: BranchLevels,
    pub defuser: BranchLevels,
}

impl EvolutionLevels {
    pub fn get(&self, kind: UnitType) -> &BranchLevels {
        match kind {
            UnitType::General => &self.general,
            UnitType::Minesweeper => &self.minesweeper,
            UnitType::Ranger => &self.ranger,
            UnitType::Maker => &self.maker,
            UnitType::Defuser => &self.defuser,
        }
    }

    pub fn get_mut(&mut self, kind: UnitType) -> &mut BranchLevels {
        match kind {
            UnitType::General => &mut self.general,
            UnitType::Minesweeper => &mut self.minesweeper,
            UnitType::Ranger => &mut self.ranger,
            UnitType::Maker => &mut self.maker,
            UnitType::Defuser => &mut self.defuser,
        }
    }
}

/// Counters that unlock evolution levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestStats {
    pub general_damage: i32,
    pub general_flag_steps: i32,
    pub sweeper_mines_marked: i32,
    pub consecutive_safe_rounds: i32,
    pub ranger_steps: i32,
    pub ranger_mines_moved: i32,
    pub maker_mines_triggered_by_enemy: i32,
    pub maker_mines_placed: i32,
    pub defuser_mines_soaked: i32,
    pub defuser_mines_disarmed: i32,
    pub sweeper_scans_this_round: i32,
}

impl QuestStats {
    /// Progress value gating the given branch of a unit type
    pub fn progress(&self, kind: UnitType, branch: Branch) -> i32 {
        match (kind, branch) {
            (UnitType::General, Branch::A) => self.general_damage,
            (UnitType::General, Branch::B) => self.general_flag_steps,
            (UnitType::Minesweeper, Branch::A) => self.sweeper_mines_marked,
            (UnitType::Minesweeper, Branch::B) => self.consecutive_safe_rounds,
            (UnitType::Ranger, Branch::A) => self.ranger_steps,
            (UnitType::Ranger, Branch::B) => self.ranger_mines_moved,
            (UnitType::Maker, Branch::A) => self.maker_mines_triggered_by_enemy,
            (UnitType::Maker, Branch::B) => self.maker_mines_placed,
            (UnitType::Defuser, Branch::A) => self.defuser_mines_soaked,
            (UnitType::Defuser, Branch::B) => self.defuser_mines_disarmed,
        }
    }
}

/// One entry of the movement history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub unit_id: UnitId,
    pub from: Position,
    pub to: Position,
    pub energy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Placement,
    Thinking,
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Pvp,
    Pve,
    Sandbox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub energy: i32,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub evolution_levels: EvolutionLevels,
    pub flag_position: Position,
    #[serde(default)]
    pub quest_stats: QuestStats,
    #[serde(default)]
    pub skip_count_this_round: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, flag_position: Position, unit_col: i32) -> Self {
        let units = UnitType::ALL
            .iter()
            .enumerate()
            .map(|(row, kind)| Unit::new(id, *kind, Position::new(row as i32 + 1, unit_col)))
            .collect();
        Self {
            id,
            energy: INITIAL_ENERGY,
            units,
            evolution_levels: EvolutionLevels::default(),
            flag_position,
            quest_stats: QuestStats::default(),
            skip_count_this_round: 0,
        }
    }

    pub fn unit(&self, kind: UnitType) -> Option<&Unit> {
        self.units.iter().find(|u| u.kind() == kind)
    }

    pub fn unit_mut(&mut self, kind: UnitType) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.kind() == kind)
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    pub fn levels(&self, kind: UnitType) -> &BranchLevels {
        self.evolution_levels.get(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub mode: GameMode,
    pub phase: Phase,
    pub current_player: PlayerId,
    pub turn_count: u32,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub is_paused: bool,
    pub cells: Vec<Vec<Cell>>,
    pub p1: PlayerState,
    pub p2: PlayerState,
    #[serde(default)]
    pub mines: Vec<Mine>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub selected_unit: Option<UnitId>,
}

impl GameState {
    /// Open board with both sides lined up on their home columns
    pub fn new_match(mode: GameMode) -> Self {
        let cells = (0..GRID_ROWS)
            .map(|_| (0..GRID_COLS).map(|_| Cell::default()).collect())
            .collect();
        Self {
            mode,
            phase: Phase::Action,
            current_player: PlayerId::P1,
            turn_count: 1,
            game_over: false,
            is_paused: false,
            cells,
            p1: PlayerState::new(PlayerId::P1, P1_FLAG_POS, 1),
            p2: PlayerState::new(PlayerId::P2, P2_FLAG_POS, GRID_COLS - 2),
            mines: Vec::new(),
            buildings: Vec::new(),
            movements: Vec::new(),
            selected_unit: None,
        }
    }

    /// Like `new_match` but scatters obstacles and ore across the middle columns
    pub fn generate<R: Rng>(mode: GameMode, obstacles: usize, ore: usize, rng: &mut R) -> Self {
        let mut state = Self::new_match(mode);
        for _ in 0..obstacles {
            if let Some(pos) = state.random_free_cell(rng) {
                if let Some(cell) = state.cell_mut(pos) {
                    cell.is_obstacle = true;
                }
            }
        }
        for i in 0..ore {
            let size = match i % 3 {
                0 => OreSize::Small,
                1 => OreSize::Medium,
                _ => OreSize::Large,
            };
            if let Some(pos) = state.random_free_cell(rng) {
                if let Some(cell) = state.cell_mut(pos) {
                    cell.ore = Some(size);
                }
            }
        }
        state
    }

    /// Reject snapshots the engine cannot index safely (loaded JSON, mostly)
    pub fn validate(&self) -> Result<()> {
        let cols_ok = self.cells.iter().all(|row| row.len() == GRID_COLS as usize);
        if self.cells.len() != GRID_ROWS as usize || !cols_ok {
            return Err(EngineError::InvalidState(format!(
                "board must be {}x{} cells",
                GRID_ROWS, GRID_COLS
            )));
        }
        for side in PlayerId::ALL {
            for unit in &self.player(side).units {
                if unit.owner() != side {
                    return Err(EngineError::InvalidState(format!("{} listed under {}", unit.id, side)));
                }
                if !Self::in_bounds(unit.pos) {
                    return Err(EngineError::InvalidState(format!("{} is off the board at {}", unit.id, unit.pos)));
                }
            }
        }
        Ok(())
    }

    fn random_free_cell<R: Rng>(&self, rng: &mut R) -> Option<Position> {
        for _ in 0..64 {
            let pos = Position::new(rng.gen_range(0..GRID_ROWS), rng.gen_range(4..GRID_COLS - 4));
            let free = self
                .cell(pos)
                .map(|cell| !cell.is_obstacle && cell.ore.is_none())
                .unwrap_or(false);
            if free && !self.is_occupied(pos) {
                return Some(pos);
            }
        }
        None
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        match id {
            PlayerId::P1 => &self.p1,
            PlayerId::P2 => &self.p2,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        match id {
            PlayerId::P1 => &mut self.p1,
            PlayerId::P2 => &mut self.p2,
        }
    }

    pub fn in_bounds(pos: Position) -> bool {
        pos.r >= 0 && pos.r < GRID_ROWS && pos.c >= 0 && pos.c < GRID_COLS
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if !Self::in_bounds(pos) {
            return None;
        }
        self.cells.get(pos.r as usize)?.get(pos.c as usize)
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if !Self::in_bounds(pos) {
            return None;
        }
        self.cells.get_mut(pos.r as usize)?.get_mut(pos.c as usize)
    }

    /// Off-board cells count as obstacles
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.cell(pos).map(|cell| cell.is_obstacle).unwrap_or(true)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.player(id.owner).unit(id.kind)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.player_mut(id.owner).unit_mut(id.kind)
    }

    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.p1.units.iter().chain(self.p2.units.iter())
    }

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.all_units().find(|u| u.is_alive() && u.pos == pos)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.unit_at(pos).is_some()
    }

    /// Occupied by a living unit other than `except`
    pub fn is_occupied_except(&self, pos: Position, except: UnitId) -> bool {
        self.all_units()
            .any(|u| u.is_alive() && u.id != except && u.pos == pos)
    }

    /// In bounds, not an obstacle and free of living units
    pub fn can_occupy(&self, pos: Position) -> bool {
        !self.is_obstacle(pos) && !self.is_occupied(pos)
    }

    pub fn mine_at(&self, pos: Position) -> Option<&Mine> {
        self.mines.iter().find(|m| m.pos == pos)
    }

    pub fn mines_of(&self, owner: PlayerId) -> impl Iterator<Item = &Mine> {
        self.mines.iter().filter(move |m| m.owner == owner)
    }

    pub fn buildings_of(&self, owner: PlayerId, kind: BuildingKind) -> impl Iterator<Item = &Building> {
        self.buildings
            .iter()
            .filter(move |b| b.owner == owner && b.kind == kind)
    }

    pub fn hub_of(&self, owner: PlayerId) -> Option<&Building> {
        self.buildings_of(owner, BuildingKind::Hub).next()
    }

    /// Movements of one unit, most recent first
    pub fn recent_movements(&self, unit_id: UnitId) -> impl Iterator<Item = &Movement> {
        self.movements.iter().rev().filter(move |m| m.unit_id == unit_id)
    }

    pub fn any_flag_carrier(&self, player: PlayerId) -> Option<&Unit> {
        self.player(player).living_units().find(|u| u.has_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_match_layout() {
        let state = GameState::new_match(GameMode::Pve);
        assert_eq!(state.cells.len(), GRID_ROWS as usize);
        assert_eq!(state.cells[0].len(), GRID_COLS as usize);
        assert_eq!(state.p1.units.len(), 5);
        assert_eq!(state.p2.units.len(), 5);
        assert!(state.p2.units.iter().all(|u| u.pos.c == GRID_COLS - 2));
    }

    #[test]
    fn test_one_unit_per_type_per_side() {
        let state = GameState::new_match(GameMode::Pvp);
        for player in PlayerId::ALL {
            for kind in UnitType::ALL {
                let count = state.player(player).units.iter().filter(|u| u.kind() == kind).count();
                assert_eq!(count, 1);
            }
        }
    }

    #[test]
    fn test_generate_keeps_home_columns_clear() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let state = GameState::generate(GameMode::Pve, 10, 4, &mut rng);
        let obstacles: usize = state.cells.iter().flatten().filter(|c| c.is_obstacle).count();
        assert!(obstacles <= 10);
        for unit in state.all_units() {
            assert!(!state.is_obstacle(unit.pos));
        }
    }

    #[test]
    fn test_validate_rejects_bad_snapshots() {
        let state = GameState::new_match(GameMode::Pve);
        assert!(state.validate().is_ok());

        let mut short = state.clone();
        short.cells.pop();
        assert!(matches!(short.validate(), Err(EngineError::InvalidState(_))));

        let mut stray = state.clone();
        stray.p2.units[0].pos = Position::new(9, 30);
        assert!(matches!(stray.validate(), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn test_off_board_is_obstacle() {
        let state = GameState::new_match(GameMode::Pve);
        assert!(state.is_obstacle(Position::new(-1, 0)));
        assert!(state.is_obstacle(Position::new(0, GRID_COLS)));
        assert!(!state.can_occupy(Position::new(7, 3)));
    }

    #[test]
    fn test_recent_movements_most_recent_first() {
        let mut state = GameState::new_match(GameMode::Pve);
        let id = UnitId::new(PlayerId::P2, UnitType::Ranger);
        state.movements.push(Movement { unit_id: id, from: Position::new(3, 12), to: Position::new(3, 11), energy: 2 });
        state.movements.push(Movement { unit_id: id, from: Position::new(3, 11), to: Position::new(3, 10), energy: 2 });
        let first = state.recent_movements(id).next().map(|m| m.from);
        assert_eq!(first, Some(Position::new(3, 11)));
    }
}
