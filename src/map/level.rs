//! # Level
//!
//! The persistent map that receives the generated layout.
//!
//! Generation only ever talks to the level through [`MapSink`]: it clears
//! cells and places terrain. Everything else about the level (stairs, spawn,
//! rendering, persistence) is read after generation has finished.

use crate::{Position, WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::Path;

/// Terrain that generation can place in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open floor; what a cleared cell becomes
    Floor,
    /// Ordinary diggable rock
    GraniteWall,
    /// Indestructible wall around the level and vaults
    PermanentWall,
    /// Staircase leading deeper
    StairsDown,
    /// Staircase leading up
    StairsUp,
}

impl Terrain {
    /// Character used by the ASCII renderer.
    pub fn glyph(self) -> char {
        match self {
            Terrain::Floor => '.',
            Terrain::GraniteWall => '#',
            Terrain::PermanentWall => '%',
            Terrain::StairsDown => '>',
            Terrain::StairsUp => '<',
        }
    }

    /// Whether a creature can walk through this terrain.
    pub fn is_passable(self) -> bool {
        matches!(self, Terrain::Floor | Terrain::StairsDown | Terrain::StairsUp)
    }
}

/// A single cell of the level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
}

impl Tile {
    /// Creates a tile holding the given terrain.
    pub fn new(terrain: Terrain) -> Self {
        Self { terrain }
    }

    /// Creates an open floor tile.
    pub fn floor() -> Self {
        Self::new(Terrain::Floor)
    }
}

/// Write access the generator needs on the real map.
///
/// The generator is the sole writer while it runs. Both operations fail with
/// [`WarrenError::OutOfBounds`] outside the map.
pub trait MapSink {
    /// Removes whatever terrain occupies the cell, leaving open floor.
    fn clear_cell(&mut self, pos: Position) -> WarrenResult<()>;

    /// Places terrain in the cell.
    fn place_terrain(&mut self, pos: Position, terrain: Terrain) -> WarrenResult<()>;
}

/// A generated dungeon level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Dungeon depth of this level
    pub depth: u32,
    /// Width in cells
    pub width: i32,
    /// Height in cells
    pub height: i32,
    /// Row-major tiles, indexed `tiles[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    /// Where the player enters the level
    pub player_spawn: Option<Position>,
    /// Positions of down staircases
    pub stairs_down: Vec<Position>,
    /// Positions of up staircases
    pub stairs_up: Vec<Position>,
}

impl Level {
    /// Creates a level of solid granite.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Level, Position, Terrain};
    ///
    /// let level = Level::new(3, 20, 10);
    /// assert_eq!(level.depth, 3);
    /// assert_eq!(level.get_tile(Position::new(19, 9)).unwrap().terrain, Terrain::GraniteWall);
    /// assert!(level.get_tile(Position::new(20, 9)).is_none());
    /// ```
    pub fn new(depth: u32, width: i32, height: i32) -> Self {
        let row = vec![Tile::new(Terrain::GraniteWall); width.max(0) as usize];
        Self {
            depth,
            width,
            height,
            tiles: vec![row; height.max(0) as usize],
            player_spawn: None,
            stairs_down: Vec::new(),
            stairs_up: Vec::new(),
        }
    }

    /// Checks if a position lies inside the level.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Gets the tile at a position.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(&self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Replaces the tile at a position.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> WarrenResult<()> {
        if !self.is_valid_position(pos) {
            return Err(WarrenError::OutOfBounds { x: pos.x, y: pos.y });
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Terrain at a position, if inside the level.
    pub fn terrain_at(&self, pos: Position) -> Option<Terrain> {
        self.get_tile(pos).map(|tile| tile.terrain)
    }

    /// Number of tiles holding the given terrain.
    pub fn count_terrain(&self, terrain: Terrain) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|tile| tile.terrain == terrain)
            .count()
    }

    /// Number of passable tiles.
    pub fn passable_count(&self) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|tile| tile.terrain.is_passable())
            .count()
    }

    /// Counts the distinct passable components that contain at least one anchor.
    ///
    /// Components are 8-connected, matching how generation judges
    /// connectivity. Anchors on impassable cells are ignored.
    pub fn passable_components(&self, anchors: &BTreeSet<Position>) -> usize {
        let mut visited = HashSet::new();
        let mut components = 0;

        for &anchor in anchors {
            let passable = self
                .terrain_at(anchor)
                .map(|terrain| terrain.is_passable())
                .unwrap_or(false);
            if !passable || visited.contains(&anchor) {
                continue;
            }

            components += 1;
            let mut queue = VecDeque::new();
            visited.insert(anchor);
            queue.push_back(anchor);

            while let Some(pos) = queue.pop_front() {
                for adjacent in pos.adjacent_positions() {
                    if visited.contains(&adjacent) {
                        continue;
                    }
                    if let Some(tile) = self.get_tile(adjacent) {
                        if tile.terrain.is_passable() {
                            visited.insert(adjacent);
                            queue.push_back(adjacent);
                        }
                    }
                }
            }
        }

        components
    }

    /// Renders the level as one line of glyphs per row.
    pub fn to_ascii(&self) -> String {
        let mut output = String::with_capacity(((self.width + 1) * self.height).max(0) as usize);
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                if self.player_spawn == Some(pos) {
                    output.push('@');
                } else {
                    output.push(tile.terrain.glyph());
                }
            }
            output.push('\n');
        }
        output
    }

    /// Writes the level to a JSON file.
    pub fn save_json(&self, path: &Path) -> WarrenResult<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads a level from a JSON file.
    pub fn load_json(path: &Path) -> WarrenResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl MapSink for Level {
    fn clear_cell(&mut self, pos: Position) -> WarrenResult<()> {
        self.set_tile(pos, Tile::floor())?;
        self.stairs_down.retain(|&stair| stair != pos);
        self.stairs_up.retain(|&stair| stair != pos);
        Ok(())
    }

    fn place_terrain(&mut self, pos: Position, terrain: Terrain) -> WarrenResult<()> {
        self.clear_cell(pos)?;
        self.set_tile(pos, Tile::new(terrain))?;
        match terrain {
            Terrain::StairsDown => self.stairs_down.push(pos),
            Terrain::StairsUp => self.stairs_up.push(pos),
            _ => {}
        }
        Ok(())
    }
}
