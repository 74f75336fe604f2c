//! A* tunnels over the grid's cost field.

use crate::{ColorMap, GenerationGrid, Position};
use log::debug;
use pathfinding::prelude::astar;

/// Finds the cheapest cardinal path from `start` into any region other than
/// `start_color`.
///
/// `end` only steers the heuristic (Manhattan distance scaled by the default
/// cost); the search stops at the first differently coloured cell it pops,
/// wherever that is. Leaving a cell costs that cell's cost, and boundary
/// cells are never expanded. Returns the path from `start` to the reached
/// cell, or an empty path if no other region is reachable.
pub fn get_astar_tunnel(
    grid: &GenerationGrid,
    color_map: &ColorMap,
    start: Position,
    end: Position,
    start_color: usize,
) -> Vec<Position> {
    let default_cost = grid.default_cost();

    let result = astar(
        &start,
        |&pos| {
            let step_cost = grid.cost(pos);
            let neighbors = if grid.is_boundary(pos) {
                Vec::new()
            } else {
                pos.cardinal_adjacent_positions()
            };
            neighbors
                .into_iter()
                .map(move |neighbor| (neighbor, step_cost))
        },
        |&pos| u64::from(pos.manhattan_distance(end)) * default_cost,
        |&pos| matches!(color_map.color_for(pos), Some(color) if color != start_color),
    );

    match result {
        Some((path, cost)) => {
            debug!("A* tunnel of {} cells, cost {}", path.len(), cost);
            path
        }
        None => {
            debug!("A* found no region reachable from {:?}", start);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_color_map, Rect};
    use std::collections::BTreeSet;

    fn rooms(grid: &mut GenerationGrid, rects: &[Rect]) -> ColorMap {
        let mut centers = BTreeSet::new();
        for rect in rects {
            for pos in rect.positions() {
                grid.set_room(pos, true);
            }
            centers.insert(rect.center());
        }
        get_color_map(grid, &centers).0
    }

    #[test]
    fn test_astar_path_is_cardinal_and_ends_in_other_region() {
        let mut grid = GenerationGrid::new(20, 20);
        let color_map = rooms(&mut grid, &[Rect::new(2, 2, 3, 3), Rect::new(14, 12, 3, 3)]);
        let start = Position::new(4, 4);
        let start_color = color_map.color_for(start).unwrap();

        let path = get_astar_tunnel(&grid, &color_map, start, Position::new(14, 12), start_color);

        assert_eq!(path[0], start);
        let end = *path.last().unwrap();
        assert!(matches!(color_map.color_for(end), Some(c) if c != start_color));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_astar_avoids_expensive_cells() {
        let mut grid = GenerationGrid::new(20, 12);
        let color_map = rooms(&mut grid, &[Rect::new(2, 5, 2, 2), Rect::new(16, 5, 2, 2)]);
        // Wall across the direct route with a gap in row 2
        for y in 1..11 {
            if y != 2 {
                grid.set_cost(Position::new(10, y), 1_000_000);
            }
        }
        let start = Position::new(3, 5);
        let start_color = color_map.color_for(start).unwrap();

        let path = get_astar_tunnel(&grid, &color_map, start, Position::new(16, 5), start_color);

        assert!(path.contains(&Position::new(10, 2)));
    }

    #[test]
    fn test_astar_unreachable_region_is_empty() {
        let mut grid = GenerationGrid::new(10, 10);
        let color_map = rooms(&mut grid, &[Rect::new(4, 4, 2, 2)]);
        let start = Position::new(4, 4);

        let path = get_astar_tunnel(&grid, &color_map, start, Position::new(8, 8), 0);

        assert!(path.is_empty());
    }
}
