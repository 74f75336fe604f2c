//! # Rectangle Placement
//!
//! Finding free rectangles on the generation grid and carving hollow or
//! filled rectangles into both the real map and the grid.

use crate::{config, CellUpdate, GenerationGrid, MapSink, Position, Rect, Terrain, WarrenResult};
use log::debug;
use rand::Rng;

/// How a carved rectangle claims the grid cells it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectangleOptions {
    /// Priority written to every touched cell (gated)
    pub priority: u32,
    pub is_pierceable: bool,
    pub is_room: bool,
    /// Clear existing terrain before placing new terrain
    pub erase_previous: bool,
    /// Tunneling cost written to every touched cell
    pub cost: u64,
}

impl Default for RectangleOptions {
    fn default() -> Self {
        Self {
            priority: 0,
            is_pierceable: false,
            is_room: false,
            erase_previous: true,
            cost: config::RECTANGLE_COST,
        }
    }
}

/// True if the rectangle lies on the grid and every cell in it sits strictly
/// below `priority`.
pub fn is_rectangle_placeable(grid: &GenerationGrid, rect: Rect, priority: u32) -> bool {
    if rect.width <= 0 || rect.height <= 0 {
        return false;
    }
    let corners = [
        Position::new(rect.x_west, rect.y_north),
        Position::new(rect.x_east(), rect.y_south()),
    ];
    if !corners.iter().all(|&corner| grid.is_in_bounds(corner)) {
        return false;
    }
    rect.positions().all(|pos| grid.is_higher_priority(pos, priority))
}

/// Finds the north-west corner of a free `width`×`height` rectangle.
///
/// Coordinates that are given are used as-is; the others are drawn at random
/// so that the rectangle stays off the outer ring. With both coordinates
/// given the rectangle is only validated. Returns None if nothing fits
/// within a fixed number of attempts.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use warren::{find_placeable_rectangle, GenerationGrid, Position};
///
/// let grid = GenerationGrid::new(30, 30);
/// let mut rng = StdRng::seed_from_u64(1);
/// let corner = find_placeable_rectangle(&grid, 5, 5, 2, Some(3), Some(4), &mut rng);
/// assert_eq!(corner, Some(Position::new(3, 4)));
/// ```
pub fn find_placeable_rectangle<R: Rng + ?Sized>(
    grid: &GenerationGrid,
    width: i32,
    height: i32,
    priority: u32,
    x_west: Option<i32>,
    y_north: Option<i32>,
    rng: &mut R,
) -> Option<Position> {
    if let (Some(x), Some(y)) = (x_west, y_north) {
        let rect = Rect::new(x, y, width, height);
        return is_rectangle_placeable(grid, rect, priority).then(|| Position::new(x, y));
    }

    let x_range = 1..=grid.width() - width - 1;
    let y_range = 1..=grid.height() - height - 1;
    if (x_west.is_none() && x_range.is_empty()) || (y_north.is_none() && y_range.is_empty()) {
        return None;
    }

    for _ in 0..config::RECTANGLE_PLACEMENT_TRIES {
        let x = x_west.unwrap_or_else(|| rng.gen_range(x_range.clone()));
        let y = y_north.unwrap_or_else(|| rng.gen_range(y_range.clone()));
        if is_rectangle_placeable(grid, Rect::new(x, y, width, height), priority) {
            return Some(Position::new(x, y));
        }
    }

    debug!(
        "no room for a {}x{} rectangle at priority {}",
        width, height, priority
    );
    None
}

fn carve_cell<M: MapSink + ?Sized>(
    map: &mut M,
    grid: &mut GenerationGrid,
    pos: Position,
    terrain: Option<Terrain>,
    options: &RectangleOptions,
) -> WarrenResult<()> {
    match terrain {
        None => map.clear_cell(pos)?,
        Some(terrain) => {
            if options.erase_previous {
                map.clear_cell(pos)?;
            }
            map.place_terrain(pos, terrain)?;
        }
    }
    grid.set_grid_info(
        pos,
        CellUpdate {
            priority: options.priority,
            is_room: options.is_room,
            is_pierceable: options.is_pierceable,
            is_tunnel: false,
            cost: Some(options.cost),
        },
    );
    Ok(())
}

/// Carves the outer ring of a rectangle, for room walls and level borders.
///
/// With no terrain the ring is simply cleared.
pub fn make_rectangle_hollow<M: MapSink + ?Sized>(
    map: &mut M,
    grid: &mut GenerationGrid,
    rect: Rect,
    terrain: Option<Terrain>,
    options: &RectangleOptions,
) -> WarrenResult<()> {
    for pos in rect.border_positions() {
        carve_cell(map, grid, pos, terrain, options)?;
    }
    Ok(())
}

/// Carves every cell of a rectangle.
pub fn make_rectangle_filled<M: MapSink + ?Sized>(
    map: &mut M,
    grid: &mut GenerationGrid,
    rect: Rect,
    terrain: Option<Terrain>,
    options: &RectangleOptions,
) -> WarrenResult<()> {
    for pos in rect.positions() {
        carve_cell(map, grid, pos, terrain, options)?;
    }
    Ok(())
}

/// Drops every center inside the rectangle. Used when a new feature
/// overwrites part of an older one.
pub fn remove_centers_in_rectangle(grid: &mut GenerationGrid, rect: Rect) {
    let inside: Vec<Position> = grid
        .centers()
        .iter()
        .copied()
        .filter(|&center| rect.contains(center))
        .collect();
    for center in inside {
        grid.remove_center(center);
    }
}
