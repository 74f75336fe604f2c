//! Angband-style wandering tunnels.
//!
//! A tunnel alternates between two states. In free rock it walks toward the
//! target, turning now and then, until it runs into something. If that
//! something is a pierceable wall it breaks into the room behind; if it is
//! an obstacle, the tracer follows the obstacle's outline with marching
//! squares until it can either enter through a pierceable cell or peel off
//! toward the target again.

use super::TUNNEL_PRIORITY;
use crate::{ColorMap, Direction, GenerationGrid, Position, TunnelParams, WarrenError, WarrenResult};
use log::{debug, error};
use rand::seq::SliceRandom;
use rand::Rng;

/// Walks through free rock from `start` toward `target`.
///
/// The returned cells exclude `start`. The walk ends on the first cell the
/// tunnel cannot claim, unless that cell is pierceable, in which case it
/// breaks one cell further in and keeps going. The first cell stepped on is
/// never treated as a stop, so a tunnel can leave its own room through the
/// wall. Returns an empty tunnel if the walk leaves the grid or runs out of
/// steps.
pub fn get_free_tunnel<R: Rng + ?Sized>(
    grid: &GenerationGrid,
    start: Position,
    target: Position,
    params: &TunnelParams,
    rng: &mut R,
) -> Vec<Position> {
    let mut tunnel = Vec::new();
    let mut pos = start;
    let mut direction = Direction::toward(start, target);
    let mut straight_run = 0;

    for _ in 0..params.free_tunnel_steps {
        pos = pos.step(direction);
        straight_run += 1;
        if !grid.is_in_bounds(pos) {
            return Vec::new();
        }
        tunnel.push(pos);

        if !grid.is_higher_priority(pos, TUNNEL_PRIORITY) {
            if grid.is_pierceable(pos) && tunnel.len() > 1 {
                pos = pos.step(direction);
                if !grid.is_in_bounds(pos) {
                    return Vec::new();
                }
                tunnel.push(pos);
            } else if tunnel.len() > 1 {
                return tunnel;
            }
        }

        if rng.gen_range(1..=100) <= params.turn_pct && straight_run > params.min_tunnel_length {
            direction = if rng.gen_range(1..=100) <= params.random_direction_pct {
                direction.random_turn(rng, 50)
            } else {
                Direction::toward(pos, target)
            };
            straight_run = 0;
        }
    }

    Vec::new()
}

/// Follows the outline of the obstacle the tunnel just ran into.
///
/// The last cell of `tunnel` is the obstacle cell; it is dropped and the
/// tracer starts from the cell before it, keeping the obstacle on its left.
/// Returns the extended tunnel once it enters the obstacle through a
/// pierceable cell or finds an open step toward `target`, and an empty
/// tunnel if neither happens within the step budget.
///
/// A suggested direction that reverses the tracer means the grid and the
/// tracked obstacle direction disagree, and is reported as
/// [`WarrenError::InvariantViolation`].
pub fn tunnel_around_obstacle<R: Rng + ?Sized>(
    grid: &GenerationGrid,
    mut tunnel: Vec<Position>,
    target: Position,
    params: &TunnelParams,
    rng: &mut R,
) -> WarrenResult<Vec<Position>> {
    let len = tunnel.len();
    if len < 2 {
        return Ok(Vec::new());
    }
    let mut obstacle_direction = Direction::toward(tunnel[len - 2], tunnel[len - 1]);
    tunnel.pop();
    let mut pos = tunnel[len - 2];
    let mut tunnel_direction = obstacle_direction.clockwise();
    debug!("tracing obstacle from {:?}", pos);

    for _ in 0..params.obstacle_steps {
        let north_west = grid.marching_square_nw(pos, obstacle_direction, false);
        let south_east = north_west + Position::new(1, 1);
        if !grid.is_in_bounds(north_west) || !grid.is_in_bounds(south_east) {
            return Ok(Vec::new());
        }

        let entrances: Vec<Position> = grid
            .adjacent_pierceable_obstacle(pos, obstacle_direction, false, TUNNEL_PRIORITY)
            .into_iter()
            .filter(|entrance| entrance.manhattan_distance(pos) == 1)
            .collect();
        if let Some(&entrance) = entrances.choose(rng) {
            if tunnel.last() != Some(&pos) {
                tunnel.push(pos);
            }
            tunnel.push(entrance);
            debug!("obstacle entrance at {:?}", entrance);
            return Ok(tunnel);
        }

        let square = grid.make_marching_square(pos, obstacle_direction, false, TUNNEL_PRIORITY);
        let suggested = square.suggested_direction(false);

        let target_direction = Direction::toward(pos, target);
        if square.exit_directions().contains(&target_direction) {
            pos = pos.step(target_direction);
            tunnel.push(pos);
            debug!("leaving obstacle at {:?} toward {:?}", pos, target);
            return Ok(tunnel);
        }

        if suggested == tunnel_direction {
            pos = pos.step(tunnel_direction);
            tunnel.push(pos);
        } else if suggested == tunnel_direction.reverse() {
            return Err(WarrenError::InvariantViolation(format!(
                "obstacle tracer at {:?} reversed from {:?}",
                pos, tunnel_direction
            )));
        } else if tunnel_direction.is_clockwise_to(suggested) {
            // Inner corner
            obstacle_direction = obstacle_direction.clockwise();
            tunnel_direction = suggested;
        } else {
            // Outer corner: take the corner cell, then wrap around it
            pos = pos.step(tunnel_direction);
            tunnel.push(pos);
            obstacle_direction = obstacle_direction.counterclockwise();
            tunnel_direction = suggested;
        }
    }

    Ok(Vec::new())
}

/// Builds a wandering tunnel from `start` that ends inside a region other
/// than `start_color`.
///
/// Free walks and obstacle traces alternate, at most
/// `params.max_obstacles` times. Any other outcome, including ending in the
/// starting region, on the boundary, or running out of obstacle budget,
/// yields an empty tunnel.
pub fn get_angband_tunnel<R: Rng + ?Sized>(
    grid: &GenerationGrid,
    color_map: &ColorMap,
    start: Position,
    target: Position,
    start_color: usize,
    params: &TunnelParams,
    rng: &mut R,
) -> Vec<Position> {
    let mut tunnel = vec![start];
    let mut from = start;

    for _ in 0..params.max_obstacles {
        let free = get_free_tunnel(grid, from, target, params, rng);
        if free.len() < 2 {
            return Vec::new();
        }
        tunnel.extend(free);

        let end = tunnel[tunnel.len() - 1];
        if grid.is_room(end) {
            return match color_map.color_for(end) {
                Some(color) if color != start_color => tunnel,
                _ => Vec::new(),
            };
        }
        if grid.is_boundary(end) {
            return Vec::new();
        }
        if grid.is_higher_priority(end, TUNNEL_PRIORITY) {
            debug!("unexplained tunnel end at {:?}", end);
            return Vec::new();
        }

        let previous_length = tunnel.len() - 1;
        tunnel = match tunnel_around_obstacle(grid, tunnel, target, params, rng) {
            Ok(traced) => traced,
            Err(err) => {
                error!("{}", err);
                return Vec::new();
            }
        };
        if tunnel.is_empty() || tunnel.len() == previous_length {
            return Vec::new();
        }
        from = tunnel[tunnel.len() - 1];
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_color_map, Rect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn straight() -> TunnelParams {
        TunnelParams {
            turn_pct: 0,
            ..TunnelParams::default()
        }
    }

    /// A room with priority 2 and pierceable walls, like the level composer makes.
    fn add_room(grid: &mut GenerationGrid, rect: Rect) {
        for pos in rect.border_positions() {
            grid.set_priority(pos, 2);
            grid.set_pierceable(pos, true, 0);
        }
        for pos in rect.inset(1).positions() {
            grid.set_priority(pos, 2);
            grid.set_room(pos, true);
        }
        grid.add_center(rect.center());
    }

    #[test]
    fn test_free_tunnel_breaks_into_room() {
        let mut grid = GenerationGrid::new(30, 10);
        add_room(&mut grid, Rect::new(20, 2, 5, 5));
        let mut rng = StdRng::seed_from_u64(1);

        let tunnel = get_free_tunnel(&grid, Position::new(3, 4), Position::new(22, 4), &straight(), &mut rng);

        assert_eq!(tunnel.first(), Some(&Position::new(4, 4)));
        assert!(tunnel.contains(&Position::new(20, 4)));
        let end = *tunnel.last().unwrap();
        assert!(grid.is_room(end));
    }

    #[test]
    fn test_free_tunnel_stops_at_obstacle() {
        let mut grid = GenerationGrid::new(30, 10);
        for y in 0..10 {
            grid.set_priority(Position::new(12, y), 5);
        }
        let mut rng = StdRng::seed_from_u64(1);

        let tunnel = get_free_tunnel(&grid, Position::new(3, 4), Position::new(25, 4), &straight(), &mut rng);

        assert_eq!(tunnel.last(), Some(&Position::new(12, 4)));
        assert_eq!(tunnel.len(), 9);
    }

    #[test]
    fn test_free_tunnel_off_grid_fails() {
        let grid = GenerationGrid::new(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let tunnel = get_free_tunnel(&grid, Position::new(5, 5), Position::new(50, 5), &straight(), &mut rng);
        assert!(tunnel.is_empty());
    }

    #[test]
    fn test_free_tunnel_out_of_steps_fails() {
        let grid = GenerationGrid::new(40, 10);
        let params = TunnelParams {
            free_tunnel_steps: 5,
            ..straight()
        };
        let mut rng = StdRng::seed_from_u64(1);

        let tunnel = get_free_tunnel(&grid, Position::new(2, 5), Position::new(35, 5), &params, &mut rng);

        assert!(tunnel.is_empty());

        let params = TunnelParams {
            free_tunnel_steps: 40,
            ..straight()
        };
        let mut room_grid = GenerationGrid::new(40, 10);
        add_room(&mut room_grid, Rect::new(30, 2, 6, 6));
        let reached = get_free_tunnel(&room_grid, Position::new(2, 5), Position::new(32, 5), &params, &mut rng);
        assert!(!reached.is_empty());
    }

    #[test]
    fn test_trace_enters_through_pierceable_cell() {
        let mut grid = GenerationGrid::new(20, 20);
        // Obstacle column at x = 10, pierceable three cells south of the hit
        for y in 3..17 {
            grid.set_priority(Position::new(10, y), 5);
        }
        grid.set_pierceable(Position::new(10, 11), true, 0);
        let mut rng = StdRng::seed_from_u64(4);

        let tunnel = vec![Position::new(8, 8), Position::new(9, 8), Position::new(10, 8)];
        let traced =
            tunnel_around_obstacle(&grid, tunnel, Position::new(15, 8), &TunnelParams::default(), &mut rng)
                .unwrap();

        assert_eq!(
            traced,
            vec![
                Position::new(8, 8),
                Position::new(9, 8),
                Position::new(9, 9),
                Position::new(9, 10),
                Position::new(9, 11),
                Position::new(10, 11),
            ]
        );
    }

    #[test]
    fn test_trace_wraps_around_a_block() {
        let mut grid = GenerationGrid::new(20, 20);
        for pos in Rect::new(10, 6, 2, 5).positions() {
            grid.set_priority(pos, 5);
        }
        let mut rng = StdRng::seed_from_u64(4);

        let tunnel = vec![Position::new(8, 8), Position::new(9, 8), Position::new(10, 8)];
        let traced =
            tunnel_around_obstacle(&grid, tunnel, Position::new(16, 8), &TunnelParams::default(), &mut rng)
                .unwrap();

        // Down the west face, under the block and out toward the target
        let end = *traced.last().unwrap();
        assert!(end.y < 6 || end.x > 11);
        assert!(traced.iter().all(|&pos| grid.is_higher_priority(pos, TUNNEL_PRIORITY)));
        for pair in traced.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_trace_needs_two_cells() {
        let grid = GenerationGrid::new(10, 10);
        let mut rng = StdRng::seed_from_u64(4);
        let traced = tunnel_around_obstacle(
            &grid,
            vec![Position::new(3, 3)],
            Position::new(8, 8),
            &TunnelParams::default(),
            &mut rng,
        )
        .unwrap();
        assert!(traced.is_empty());
    }

    #[test]
    fn test_angband_tunnel_joins_two_rooms() {
        let mut grid = GenerationGrid::new(40, 12);
        add_room(&mut grid, Rect::new(2, 3, 6, 6));
        add_room(&mut grid, Rect::new(30, 3, 6, 6));
        let centers: BTreeSet<_> = grid.centers().clone();
        let (color_map, _) = get_color_map(&grid, &centers);
        let start = Position::new(6, 5);
        let start_color = color_map.color_for(start).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let tunnel = get_angband_tunnel(
            &grid,
            &color_map,
            start,
            Position::new(31, 5),
            start_color,
            &straight(),
            &mut rng,
        );

        assert_eq!(tunnel.first(), Some(&start));
        let end = *tunnel.last().unwrap();
        assert!(matches!(color_map.color_for(end), Some(c) if c != start_color));
    }

    #[test]
    fn test_angband_tunnel_rejects_own_region() {
        let mut grid = GenerationGrid::new(40, 12);
        add_room(&mut grid, Rect::new(2, 3, 6, 6));
        let centers: BTreeSet<_> = grid.centers().clone();
        let (color_map, _) = get_color_map(&grid, &centers);
        let mut rng = StdRng::seed_from_u64(8);

        // Target lies back inside the starting room
        let tunnel = get_angband_tunnel(
            &grid,
            &color_map,
            Position::new(3, 5),
            Position::new(6, 5),
            0,
            &straight(),
            &mut rng,
        );

        assert!(tunnel.is_empty());
    }
}
