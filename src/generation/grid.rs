//! # Generation Grid
//!
//! Scratch per-cell state used while a level is being laid out.
//!
//! Every cell carries a tunneling cost, room/tunnel/pierceable flags and a
//! priority: the ownership level of whichever feature last claimed it. A
//! feature may only claim a cell by raising its priority, so rooms cannot
//! carve through vaults and tunnels cannot carve through rooms.
//!
//! Out-of-range coordinates are programmer errors. Every per-cell accessor
//! panics on them instead of returning a `Result`.

use crate::utils::MarchingSquare;
use crate::{config, Direction, Position, WarrenError, WarrenResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-cell generation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cost of tunneling out of this cell
    pub cost: u64,
    pub is_room: bool,
    pub is_tunnel: bool,
    /// A wandering tunnel may break into the feature through this cell
    pub is_pierceable: bool,
    /// Ownership level of the feature that last claimed this cell
    pub priority: u32,
}

impl Cell {
    /// Creates an unclaimed cell with the given cost.
    pub fn new(cost: u64) -> Self {
        Self {
            cost,
            is_room: false,
            is_tunnel: false,
            is_pierceable: false,
            priority: 0,
        }
    }
}

/// Every field of a cell, written in one call by [`GenerationGrid::set_grid_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellUpdate {
    pub priority: u32,
    pub is_room: bool,
    pub is_pierceable: bool,
    pub is_tunnel: bool,
    /// New cost; the grid's default cost when None
    pub cost: Option<u64>,
}

/// Restrictions for [`GenerationGrid::random_cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellFilter {
    pub room: bool,
    pub pierceable: bool,
}

/// The scratch grid shared by every generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationGrid {
    width: i32,
    height: i32,
    default_cost: u64,
    /// Row-major, `cells[y * width + x]`
    cells: Vec<Cell>,
    centers: BTreeSet<Position>,
    vault_centers: BTreeSet<Position>,
    junctions: BTreeSet<Position>,
}

impl GenerationGrid {
    /// Creates a grid of unclaimed cells at the default cost.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GenerationGrid, Position};
    ///
    /// let grid = GenerationGrid::new(20, 10);
    /// assert!(grid.is_in_bounds(Position::new(19, 9)));
    /// assert!(grid.is_boundary(Position::new(0, 4)));
    /// assert_eq!(grid.cost(Position::new(3, 3)), 20);
    /// ```
    pub fn new(width: i32, height: i32) -> Self {
        let default_cost = config::DEFAULT_COST;
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            default_cost,
            cells: vec![Cell::new(default_cost); size],
            centers: BTreeSet::new(),
            vault_centers: BTreeSet::new(),
            junctions: BTreeSet::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Background tunneling cost of an untouched cell.
    pub fn default_cost(&self) -> u64 {
        self.default_cost
    }

    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// True on the outer ring of the grid.
    pub fn is_boundary(&self, pos: Position) -> bool {
        pos.x == 0 || pos.y == 0 || pos.x == self.width - 1 || pos.y == self.height - 1
    }

    fn index(&self, pos: Position) -> usize {
        if !self.is_in_bounds(pos) {
            panic!(
                "generation grid access at ({}, {}) outside {}x{}",
                pos.x, pos.y, self.width, self.height
            );
        }
        (pos.y * self.width + pos.x) as usize
    }

    /// Reads a cell.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the grid, as do all per-cell accessors.
    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.index(pos)]
    }

    fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        let index = self.index(pos);
        &mut self.cells[index]
    }

    // Priority

    /// True if `priority` is strictly above the cell's current priority.
    pub fn is_higher_priority(&self, pos: Position, priority: u32) -> bool {
        priority > self.cell(pos).priority
    }

    pub fn priority(&self, pos: Position) -> u32 {
        self.cell(pos).priority
    }

    /// Raises the cell's priority. Returns false, leaving the cell untouched,
    /// unless `priority` is strictly higher than the current value.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GenerationGrid, Position};
    ///
    /// let mut grid = GenerationGrid::new(10, 10);
    /// let pos = Position::new(5, 5);
    /// assert!(grid.set_priority(pos, 3));
    /// assert!(!grid.set_priority(pos, 1));
    /// assert_eq!(grid.priority(pos), 3);
    /// ```
    pub fn set_priority(&mut self, pos: Position, priority: u32) -> bool {
        if self.is_higher_priority(pos, priority) {
            self.cell_mut(pos).priority = priority;
            true
        } else {
            false
        }
    }

    /// Sets the priority regardless of its current value.
    pub fn overwrite_priority(&mut self, pos: Position, priority: u32) {
        self.cell_mut(pos).priority = priority;
    }

    // Flags

    pub fn is_pierceable(&self, pos: Position) -> bool {
        self.cell(pos).is_pierceable
    }

    /// Sets the pierceable flag. A nonzero `priority` gates the write like
    /// [`set_priority`](Self::set_priority) does; zero writes unconditionally.
    pub fn set_pierceable(&mut self, pos: Position, value: bool, priority: u32) {
        if priority == 0 || self.is_higher_priority(pos, priority) {
            self.cell_mut(pos).is_pierceable = value;
        }
    }

    pub fn is_tunnel(&self, pos: Position) -> bool {
        self.cell(pos).is_tunnel
    }

    pub fn set_tunnel(&mut self, pos: Position, value: bool) {
        self.cell_mut(pos).is_tunnel = value;
    }

    pub fn is_room(&self, pos: Position) -> bool {
        self.cell(pos).is_room
    }

    pub fn set_room(&mut self, pos: Position, value: bool) {
        self.cell_mut(pos).is_room = value;
    }

    /// Room and tunnel cells both count as traversable.
    pub fn is_clear(&self, pos: Position) -> bool {
        let cell = self.cell(pos);
        cell.is_room || cell.is_tunnel
    }

    /// Counts room cells in the 8-neighborhood, ignoring neighbors off the grid.
    pub fn num_adjacent_rooms(&self, pos: Position) -> usize {
        pos.adjacent_positions()
            .into_iter()
            .filter(|&adjacent| self.is_in_bounds(adjacent) && self.is_room(adjacent))
            .count()
    }

    // Cost

    pub fn cost(&self, pos: Position) -> u64 {
        self.cell(pos).cost
    }

    pub fn set_cost(&mut self, pos: Position, cost: u64) {
        self.cell_mut(pos).cost = cost;
    }

    /// Adds to the existing cost, saturating instead of wrapping.
    pub fn add_cost(&mut self, pos: Position, extra: u64) {
        let cell = self.cell_mut(pos);
        cell.cost = cell.cost.saturating_add(extra);
    }

    /// Writes every field of a cell at once.
    ///
    /// Only the priority write is gated; the flags and cost are always set.
    pub fn set_grid_info(&mut self, pos: Position, update: CellUpdate) {
        self.set_priority(pos, update.priority);
        let default_cost = self.default_cost;
        let cell = self.cell_mut(pos);
        cell.is_pierceable = update.is_pierceable;
        cell.is_room = update.is_room;
        cell.is_tunnel = update.is_tunnel;
        cell.cost = update.cost.unwrap_or(default_cost);
    }

    // Centers

    /// Anchors that must end up in the single connected component.
    pub fn centers(&self) -> &BTreeSet<Position> {
        &self.centers
    }

    pub fn is_center(&self, pos: Position) -> bool {
        self.centers.contains(&pos)
    }

    /// # Panics
    ///
    /// Panics if `pos` is outside the grid.
    pub fn add_center(&mut self, pos: Position) {
        self.index(pos);
        self.centers.insert(pos);
    }

    /// Adds many centers at once. Positions are not bounds checked.
    pub fn add_several_centers<I>(&mut self, centers: I)
    where
        I: IntoIterator<Item = Position>,
    {
        self.centers.extend(centers);
    }

    pub fn remove_center(&mut self, pos: Position) {
        self.centers.remove(&pos);
    }

    /// A uniformly chosen center, or None when there are none.
    pub fn random_center<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        choose(&self.centers, rng)
    }

    /// Centers of features the wandering-tunnel strategy must leave alone.
    pub fn vault_centers(&self) -> &BTreeSet<Position> {
        &self.vault_centers
    }

    /// # Panics
    ///
    /// Panics if `pos` is outside the grid.
    pub fn add_vault_center(&mut self, pos: Position) {
        self.index(pos);
        self.vault_centers.insert(pos);
    }

    // Junctions

    pub fn junctions(&self) -> &BTreeSet<Position> {
        &self.junctions
    }

    pub fn is_junction(&self, pos: Position) -> bool {
        self.junctions.contains(&pos)
    }

    /// # Panics
    ///
    /// Panics if `pos` is outside the grid.
    pub fn add_junction(&mut self, pos: Position) {
        self.index(pos);
        self.junctions.insert(pos);
    }

    pub fn remove_junction(&mut self, pos: Position) {
        self.junctions.remove(&pos);
    }

    /// A uniformly chosen junction.
    pub fn random_junction<R: Rng + ?Sized>(&self, rng: &mut R) -> WarrenResult<Position> {
        choose(&self.junctions, rng)
            .ok_or_else(|| WarrenError::GenerationFailed("no junctions to choose from".to_string()))
    }

    /// Samples random cells until one passes the filter.
    ///
    /// Gives up with an error after a bounded number of tries.
    pub fn random_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        filter: CellFilter,
    ) -> WarrenResult<Position> {
        if self.width <= 0 || self.height <= 0 {
            return Err(WarrenError::GenerationFailed("grid has no cells".to_string()));
        }
        for _ in 0..config::RANDOM_CELL_TRIES {
            let pos = Position::new(
                rng.gen_range(0..self.width),
                rng.gen_range(0..self.height),
            );
            let cell = self.cell(pos);
            if filter.room && !cell.is_room {
                continue;
            }
            if filter.pierceable && !cell.is_pierceable {
                continue;
            }
            return Ok(pos);
        }
        Err(WarrenError::GenerationFailed(format!(
            "no cell matching {:?} found in {} tries",
            filter,
            config::RANDOM_CELL_TRIES
        )))
    }

    // Marching squares

    /// North-west corner of the 2×2 window that holds `pos` and the obstacle
    /// cell in `obstacle_direction`.
    ///
    /// The window is oriented so that, following the outline counterclockwise
    /// (obstacle on the left), the tracer sits in the same relative corner
    /// every time. The clockwise orientation mirrors it.
    pub fn marching_square_nw(
        &self,
        pos: Position,
        obstacle_direction: Direction,
        clockwise: bool,
    ) -> Position {
        use Direction::*;
        let offset = match (clockwise, obstacle_direction) {
            (false, West) | (true, North) => Position::new(-1, -1),
            (false, North) | (true, East) => Position::new(0, -1),
            (false, South) | (true, West) => Position::new(-1, 0),
            (false, East) | (true, South) => Position::new(0, 0),
        };
        pos + offset
    }

    /// Classifies the window around `pos`: a corner is open when `priority`
    /// could claim it.
    ///
    /// # Panics
    ///
    /// Panics if the window leaves the grid. A high-priority border keeps
    /// the tracer away from the edge.
    pub fn make_marching_square(
        &self,
        pos: Position,
        obstacle_direction: Direction,
        clockwise: bool,
        priority: u32,
    ) -> MarchingSquare {
        let nw = self.marching_square_nw(pos, obstacle_direction, clockwise);
        MarchingSquare::new(
            self.is_higher_priority(nw, priority),
            self.is_higher_priority(nw + Position::new(1, 0), priority),
            self.is_higher_priority(nw + Position::new(0, 1), priority),
            self.is_higher_priority(nw + Position::new(1, 1), priority),
        )
    }

    /// Cells of the window that belong to the obstacle and may be tunneled into.
    pub fn adjacent_pierceable_obstacle(
        &self,
        pos: Position,
        obstacle_direction: Direction,
        clockwise: bool,
        priority: u32,
    ) -> BTreeSet<Position> {
        let nw = self.marching_square_nw(pos, obstacle_direction, clockwise);
        let mut entrances = BTreeSet::new();
        for dy in 0..2 {
            for dx in 0..2 {
                let corner = nw + Position::new(dx, dy);
                if !self.is_higher_priority(corner, priority) && self.is_pierceable(corner) {
                    entrances.insert(corner);
                }
            }
        }
        entrances
    }
}

fn choose<R: Rng + ?Sized>(set: &BTreeSet<Position>, rng: &mut R) -> Option<Position> {
    if set.is_empty() {
        return None;
    }
    set.iter().nth(rng.gen_range(0..set.len())).copied()
}
