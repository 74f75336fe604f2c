//! # Marching Squares
//!
//! Classification of a 2×2 window for following the outline of an obstacle.
//!
//! Each corner is `true` when the tracer may tunnel there and `false` when it
//! belongs to the obstacle. The four corners form a key (north-west 8,
//! north-east 4, south-west 2, south-east 1) that indexes precomputed tables
//! of the direction to keep hugging the outline and the directions in which
//! the tracer may leave it.

use crate::Direction;
use crate::Direction::{East as E, North as N, South as S, West as W};

/// Suggested direction per key when keeping the obstacle on the left.
const COUNTERCLOCKWISE: [Direction; 16] = [
    E, E, S, E, //
    N, N, N, N, //
    W, W, S, E, //
    W, W, S, W, //
];

/// Suggested direction per key when keeping the obstacle on the right.
const CLOCKWISE: [Direction; 16] = [
    W, S, W, W, //
    E, S, S, W, //
    N, E, N, N, //
    E, S, E, E, //
];

/// Directions that lead away from the obstacle, per key.
const EXITS: [&[Direction]; 16] = [
    &[],
    &[],
    &[],
    &[S],
    &[],
    &[E],
    &[],
    &[E, S],
    &[],
    &[],
    &[W],
    &[W, S],
    &[N],
    &[E, N],
    &[W, N],
    &[S, E, W, N],
];

/// A 2×2 window of open (`true`) and blocked (`false`) cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarchingSquare {
    pub north_west: bool,
    pub north_east: bool,
    pub south_west: bool,
    pub south_east: bool,
}

impl MarchingSquare {
    /// Builds a window from its four corners.
    pub fn new(north_west: bool, north_east: bool, south_west: bool, south_east: bool) -> Self {
        Self {
            north_west,
            north_east,
            south_west,
            south_east,
        }
    }

    /// Table index for this window.
    pub fn key(&self) -> usize {
        let mut key = 0;
        if self.north_west {
            key += 8;
        }
        if self.north_east {
            key += 4;
        }
        if self.south_west {
            key += 2;
        }
        if self.south_east {
            key += 1;
        }
        key
    }

    /// Direction that keeps following the outline.
    ///
    /// A fully blocked window has no meaningful answer and yields east, which
    /// callers treat like any other suggestion.
    pub fn suggested_direction(&self, clockwise: bool) -> Direction {
        if clockwise {
            CLOCKWISE[self.key()]
        } else {
            COUNTERCLOCKWISE[self.key()]
        }
    }

    /// Directions in which the tracer can break away from the obstacle.
    pub fn exit_directions(&self) -> &'static [Direction] {
        EXITS[self.key()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_weights() {
        assert_eq!(MarchingSquare::new(true, false, false, false).key(), 8);
        assert_eq!(MarchingSquare::new(false, true, false, false).key(), 4);
        assert_eq!(MarchingSquare::new(false, false, true, false).key(), 2);
        assert_eq!(MarchingSquare::new(false, false, false, true).key(), 1);
        assert_eq!(MarchingSquare::new(true, true, true, true).key(), 15);
    }

    #[test]
    fn test_straight_wall_to_the_west() {
        // Obstacle fills the western column
        let square = MarchingSquare::new(false, true, false, true);
        assert_eq!(square.key(), 5);
        assert_eq!(square.suggested_direction(false), Direction::North);
        assert_eq!(square.suggested_direction(true), Direction::South);
        assert_eq!(square.exit_directions(), &[Direction::East]);
    }

    #[test]
    fn test_open_window_allows_every_exit() {
        let square = MarchingSquare::new(true, true, true, true);
        assert_eq!(square.exit_directions().len(), 4);
        let blocked = MarchingSquare::new(false, false, false, false);
        assert!(blocked.exit_directions().is_empty());
    }
}
