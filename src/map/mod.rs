//! # Map Module
//!
//! Grid geometry shared by every generation stage, and the persistent level
//! that receives the finished layout.
//!
//! - [`Position`], [`Direction`] and [`Rect`] describe locations on the grid
//! - [`Level`] is the real map; generation writes to it through [`MapSink`]

pub mod level;

pub use level::*;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the grid. South is positive `y`.
///
/// # Examples
///
/// ```
/// use warren::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.adjacent_positions();
/// assert_eq!(adjacent.len(), 8); // All 8 surrounding positions
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the neighbouring position one step in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Returns all 8 adjacent positions (including diagonals).
    pub fn adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x - 1, self.y - 1), // NW
            Position::new(self.x, self.y - 1),     // N
            Position::new(self.x + 1, self.y - 1), // NE
            Position::new(self.x - 1, self.y),     // W
            Position::new(self.x + 1, self.y),     // E
            Position::new(self.x - 1, self.y + 1), // SW
            Position::new(self.x, self.y + 1),     // S
            Position::new(self.x + 1, self.y + 1), // SE
        ]
    }

    /// Returns only the 4 cardinal adjacent positions, in [`Direction::CARDINAL`] order.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::CARDINAL.iter().map(|&d| self.step(d)).collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Cardinal directions used by tunnels and the contour tracer.
///
/// Clockwise is as seen on screen with south pointing down:
/// east, south, west, north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Expansion order for tunnel searches.
    pub const CARDINAL: [Direction; 4] = [
        Direction::South,
        Direction::East,
        Direction::North,
        Direction::West,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// Rotates 90 degrees clockwise.
    pub fn clockwise(self) -> Direction {
        match self {
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            Direction::North => Direction::East,
        }
    }

    /// Rotates 90 degrees counterclockwise.
    pub fn counterclockwise(self) -> Direction {
        match self {
            Direction::East => Direction::North,
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
        }
    }

    /// Returns the opposite direction.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// True if `other` is this direction rotated 90 degrees clockwise.
    pub fn is_clockwise_to(self, other: Direction) -> bool {
        self.clockwise() == other
    }

    /// Turns 90 degrees, clockwise with probability `clockwise_pct` percent.
    pub fn random_turn<R: Rng + ?Sized>(self, rng: &mut R, clockwise_pct: u32) -> Direction {
        if rng.gen_range(1..=100) <= clockwise_pct {
            self.clockwise()
        } else {
            self.counterclockwise()
        }
    }

    /// Picks the cardinal direction that heads most directly from `start` to `end`.
    ///
    /// Ties between the axes go to the horizontal direction, and identical
    /// points yield east.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Direction, Position};
    ///
    /// let start = Position::new(5, 5);
    /// assert_eq!(Direction::toward(start, Position::new(9, 7)), Direction::East);
    /// assert_eq!(Direction::toward(start, Position::new(4, 1)), Direction::North);
    /// ```
    pub fn toward(start: Position, end: Position) -> Direction {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();

        if dx >= dy {
            if end.x >= start.x {
                Direction::East
            } else {
                Direction::West
            }
        } else if end.y >= start.y {
            Direction::South
        } else {
            Direction::North
        }
    }
}

/// An axis-aligned rectangle anchored at its north-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x_west: i32,
    pub y_north: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle from its north-west corner and size.
    pub fn new(x_west: i32, y_north: i32, width: i32, height: i32) -> Self {
        Self {
            x_west,
            y_north,
            width,
            height,
        }
    }

    /// Creates a rectangle from a corner position and size.
    pub fn at(corner: Position, width: i32, height: i32) -> Self {
        Self::new(corner.x, corner.y, width, height)
    }

    /// Easternmost column inside the rectangle.
    pub fn x_east(&self) -> i32 {
        self.x_west + self.width - 1
    }

    /// Southernmost row inside the rectangle.
    pub fn y_south(&self) -> i32 {
        self.y_north + self.height - 1
    }

    /// Number of cells covered.
    pub fn area(&self) -> usize {
        (self.width.max(0) * self.height.max(0)) as usize
    }

    /// Center cell, rounded toward the north-west.
    pub fn center(&self) -> Position {
        Position::new(self.x_west + self.width / 2, self.y_north + self.height / 2)
    }

    /// Checks if a position is inside this rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Position, Rect};
    ///
    /// let rect = Rect::new(5, 5, 10, 8);
    /// assert!(rect.contains(Position::new(7, 7)));
    /// assert!(!rect.contains(Position::new(15, 5)));
    /// ```
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x_west
            && pos.y >= self.y_north
            && pos.x < self.x_west + self.width
            && pos.y < self.y_north + self.height
    }

    /// Shrinks the rectangle by `margin` cells on every side.
    pub fn inset(&self, margin: i32) -> Rect {
        Rect::new(
            self.x_west + margin,
            self.y_north + margin,
            self.width - 2 * margin,
            self.height - 2 * margin,
        )
    }

    /// All positions inside the rectangle, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let rect = *self;
        (rect.y_north..rect.y_north + rect.height)
            .flat_map(move |y| (rect.x_west..rect.x_west + rect.width).map(move |x| Position::new(x, y)))
    }

    /// Positions on the outer ring of the rectangle, each listed once.
    pub fn border_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        if self.width <= 0 || self.height <= 0 {
            return positions;
        }

        // Top and bottom rows
        for x in self.x_west..=self.x_east() {
            positions.push(Position::new(x, self.y_north));
            if self.height > 1 {
                positions.push(Position::new(x, self.y_south()));
            }
        }

        // West and east columns (excluding corners already added)
        for y in (self.y_north + 1)..self.y_south() {
            positions.push(Position::new(self.x_west, y));
            if self.width > 1 {
                positions.push(Position::new(self.x_east(), y));
            }
        }

        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_position_manhattan_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
    }

    #[test]
    fn test_position_cardinal_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.cardinal_adjacent_positions();
        assert_eq!(adjacent.len(), 4);
        assert!(adjacent.contains(&Position::new(5, 4))); // North
        assert!(adjacent.contains(&Position::new(4, 5))); // West
        assert!(!adjacent.contains(&Position::new(4, 4))); // No diagonal
    }

    #[test]
    fn test_rotation_cycles() {
        for direction in Direction::CARDINAL {
            assert_eq!(direction.clockwise().counterclockwise(), direction);
            assert_eq!(direction.clockwise().clockwise(), direction.reverse());
            assert!(direction.is_clockwise_to(direction.clockwise()));
            assert!(!direction.is_clockwise_to(direction.counterclockwise()));
        }
        assert_eq!(Direction::East.clockwise(), Direction::South);
        assert_eq!(Direction::East.counterclockwise(), Direction::North);
    }

    #[test]
    fn test_direction_toward() {
        let start = Position::new(10, 10);
        assert_eq!(Direction::toward(start, Position::new(10, 10)), Direction::East);
        assert_eq!(Direction::toward(start, Position::new(5, 10)), Direction::West);
        assert_eq!(Direction::toward(start, Position::new(10, 15)), Direction::South);
        assert_eq!(Direction::toward(start, Position::new(11, 3)), Direction::North);
        // Diagonal ties favour the horizontal axis
        assert_eq!(Direction::toward(start, Position::new(7, 7)), Direction::West);
    }

    #[test]
    fn test_random_turn_is_perpendicular() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let turned = Direction::North.random_turn(&mut rng, 50);
            assert!(turned == Direction::East || turned == Direction::West);
        }
        assert_eq!(Direction::North.random_turn(&mut rng, 100), Direction::East);
        assert_eq!(Direction::North.random_turn(&mut rng, 0), Direction::West);
    }

    #[test]
    fn test_rect_geometry() {
        let rect = Rect::new(2, 3, 4, 5);
        assert_eq!(rect.x_east(), 5);
        assert_eq!(rect.y_south(), 7);
        assert_eq!(rect.area(), 20);
        assert_eq!(rect.center(), Position::new(4, 5));
        assert_eq!(rect.positions().count(), 20);
        assert!(rect.positions().all(|p| rect.contains(p)));
    }

    #[test]
    fn test_rect_border_positions() {
        let rect = Rect::new(0, 0, 4, 4);
        let border = rect.border_positions();
        let unique: HashSet<_> = border.iter().copied().collect();
        assert_eq!(border.len(), 12);
        assert_eq!(unique.len(), 12);
        assert!(!unique.contains(&Position::new(1, 1)));

        assert_eq!(Rect::new(0, 0, 1, 1).border_positions().len(), 1);
    }
}
