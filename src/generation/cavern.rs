//! # Cavern Generation
//!
//! Organic caves grown with a cellular automaton inside a bounding box.
//!
//! Only the cave floor is claimed. The rest of the bounding box stays open to
//! other features, so a sparse cave does not block the level.

use crate::utils::{mesh, nearby_location};
use crate::{
    connect_rooms, find_placeable_rectangle, get_color_map_for_area, CellUpdate, ColorMap,
    ConnectOptions, GenerationConfig, GenerationGrid, MapSink, NoiseKind, Position, Rect,
    TunnelStyle, WarrenResult,
};
use log::{debug, warn};
use rand::Rng;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Cellular-automaton cave carver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CavernGenerator {
    /// Bounding box size
    pub width: i32,
    pub height: i32,
    /// Priority claimed by cave floor cells
    pub priority: u32,
    /// Percent of the box seeded as floor before mutation
    pub density: RangeInclusive<u32>,
    /// Automaton passes
    pub mutations: u32,
    /// Spacing of the mesh that picks cave centers
    pub center_spacing: i32,
    /// Fragments smaller than this are filled back in
    pub min_region_size: usize,
}

impl CavernGenerator {
    /// Creates a cavern generator with the standard automaton settings.
    pub fn new(width: i32, height: i32, priority: u32) -> Self {
        Self {
            width,
            height,
            priority,
            density: 40..=50,
            mutations: 4,
            center_spacing: 4,
            min_region_size: 8,
        }
    }

    /// Cavern settings of a level configuration.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.cavern_width, config.cavern_height, config.cavern_priority)
    }

    /// Carves one cavern and connects it internally.
    ///
    /// Returns the centers registered for the cave, or None if no bounding
    /// box fits or nothing survives the automaton. A failed cavern is not an
    /// error; the level simply goes without one.
    pub fn create<M, R>(
        &self,
        map: &mut M,
        grid: &mut GenerationGrid,
        options: &ConnectOptions,
        rng: &mut R,
    ) -> WarrenResult<Option<BTreeSet<Position>>>
    where
        M: MapSink + ?Sized,
        R: Rng + ?Sized,
    {
        let density = rng.gen_range(self.density.clone());

        let corner = match find_placeable_rectangle(
            grid,
            self.width,
            self.height,
            self.priority,
            None,
            None,
            rng,
        ) {
            Some(corner) => corner,
            None => {
                warn!("no room for a {}x{} cavern", self.width, self.height);
                return Ok(None);
            }
        };
        let rect = Rect::at(corner, self.width, self.height);
        debug!("generating cavern at {:?}, density {}%", corner, density);

        for pos in rect.positions() {
            grid.set_grid_info(pos, CellUpdate::default());
        }
        initialize_cavern(grid, rect, density, rng);
        for _ in 0..self.mutations {
            mutate_cavern(grid, rect);
        }

        let mut color_map = get_color_map_for_area(grid, rect);
        debug!("{} cavern regions before pruning", color_map.len());
        remove_small_regions(grid, &mut color_map, self.min_region_size);
        if color_map.is_empty() {
            warn!("cavern at {:?} has no surviving floor", corner);
            return Ok(None);
        }
        debug!("{} cavern regions after pruning", color_map.len());

        let points: BTreeSet<Position> = color_map.regions().iter().flatten().copied().collect();
        for &pos in &points {
            grid.set_priority(pos, self.priority);
            map.clear_cell(pos)?;
        }

        let centers = cavern_centers(&points, &mesh(rect, self.center_spacing));
        grid.add_several_centers(centers.iter().copied());

        let options = options.with(TunnelStyle::AStar, NoiseKind::Block);
        connect_rooms(map, grid, &options, Some(&centers), rng)?;

        Ok(Some(centers))
    }
}

/// Marks `density` percent of the rectangle's area as room, at random
/// cells (repeats allowed).
pub fn initialize_cavern<R: Rng + ?Sized>(
    grid: &mut GenerationGrid,
    rect: Rect,
    density: u32,
    rng: &mut R,
) {
    let seeds = rect.area() * density as usize / 100;
    for _ in 0..seeds {
        let pos = Position::new(
            rng.gen_range(rect.x_west..=rect.x_east()),
            rng.gen_range(rect.y_north..=rect.y_south()),
        );
        grid.set_room(pos, true);
    }
}

/// One automaton pass over the rectangle.
///
/// Fewer than 3 room neighbours empties a cell, more than 4 fills it, and
/// 3 or 4 keep it as it was. Every cell sees the previous generation.
pub fn mutate_cavern(grid: &mut GenerationGrid, rect: Rect) {
    let next: Vec<(Position, bool)> = rect
        .positions()
        .map(|pos| {
            let is_room = match grid.num_adjacent_rooms(pos) {
                0..=2 => false,
                3..=4 => grid.is_room(pos),
                _ => true,
            };
            (pos, is_room)
        })
        .collect();

    for (pos, is_room) in next {
        grid.set_room(pos, is_room);
    }
}

/// Drops regions smaller than `min_size` and clears their room flag.
pub fn remove_small_regions(grid: &mut GenerationGrid, color_map: &mut ColorMap, min_size: usize) {
    for region in color_map.regions() {
        if region.len() < min_size {
            for &pos in region {
                grid.set_room(pos, false);
            }
        }
    }
    color_map.retain(|region| region.len() >= min_size);
}

/// Snaps every mesh point to the nearest cave floor cell.
pub fn cavern_centers(points: &BTreeSet<Position>, mesh: &[Position]) -> BTreeSet<Position> {
    mesh.iter()
        .filter_map(|&target| nearby_location(points, target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_full_cavern_is_a_fixed_point() {
        let mut grid = GenerationGrid::new(20, 20);
        let rect = Rect::new(5, 5, 10, 10);
        for pos in rect.positions() {
            grid.set_room(pos, true);
        }

        for _ in 0..4 {
            mutate_cavern(&mut grid, rect);
        }

        assert!(rect.positions().all(|pos| grid.is_room(pos)));
        assert!(!grid.is_room(Position::new(4, 4)));
    }

    #[test]
    fn test_isolated_cells_die() {
        let mut grid = GenerationGrid::new(10, 10);
        let rect = Rect::new(0, 0, 10, 10);
        grid.set_room(Position::new(2, 2), true);
        grid.set_room(Position::new(7, 7), true);
        grid.set_room(Position::new(7, 8), true);

        mutate_cavern(&mut grid, rect);

        assert!(rect.positions().all(|pos| !grid.is_room(pos)));
    }

    #[test]
    fn test_crowded_cell_is_born() {
        let mut grid = GenerationGrid::new(10, 10);
        let center = Position::new(5, 5);
        for pos in center.adjacent_positions().into_iter().take(5) {
            grid.set_room(pos, true);
        }

        mutate_cavern(&mut grid, Rect::new(0, 0, 10, 10));

        assert!(grid.is_room(center));
    }

    #[test]
    fn test_remove_small_regions() {
        let mut grid = GenerationGrid::new(20, 20);
        grid.set_room(Position::new(2, 2), true);
        for pos in Rect::new(8, 8, 3, 3).positions() {
            grid.set_room(pos, true);
        }
        let mut color_map = get_color_map_for_area(&grid, Rect::new(0, 0, 20, 20));

        remove_small_regions(&mut grid, &mut color_map, 8);

        assert_eq!(color_map.len(), 1);
        assert!(!grid.is_room(Position::new(2, 2)));
        assert!(grid.is_room(Position::new(9, 9)));
    }

    #[test]
    fn test_seeding_stays_inside_rect() {
        let mut grid = GenerationGrid::new(30, 30);
        let rect = Rect::new(5, 5, 10, 10);
        let mut rng = StdRng::seed_from_u64(21);

        initialize_cavern(&mut grid, rect, 50, &mut rng);

        let rooms: Vec<Position> = Rect::new(0, 0, 30, 30)
            .positions()
            .filter(|&pos| grid.is_room(pos))
            .collect();
        assert!(!rooms.is_empty() && rooms.len() <= 50);
        assert!(rooms.iter().all(|&pos| rect.contains(pos)));
    }

    #[test]
    fn test_cavern_centers_snap_to_floor() {
        let points: BTreeSet<_> = [Position::new(3, 3), Position::new(10, 10)].into_iter().collect();
        let centers = cavern_centers(&points, &[Position::new(0, 0), Position::new(12, 12)]);
        assert_eq!(centers, points);
    }

    #[test]
    fn test_create_cavern_connects_itself() {
        let mut level = Level::new(0, 60, 50);
        let mut grid = GenerationGrid::new(60, 50);
        let mut rng = StdRng::seed_from_u64(99);
        let generator = CavernGenerator::new(40, 30, 1);

        let centers = generator
            .create(&mut level, &mut grid, &ConnectOptions::default(), &mut rng)
            .unwrap()
            .expect("cavern should fit in an empty grid");

        assert!(!centers.is_empty());
        assert!(centers.iter().all(|&center| grid.is_clear(center)));
        assert!(centers.iter().all(|&center| grid.is_center(center)));
        assert!(level.passable_count() > 0);
    }

    #[test]
    fn test_cavern_too_large_is_skipped() {
        let mut level = Level::new(0, 30, 30);
        let mut grid = GenerationGrid::new(30, 30);
        let mut rng = StdRng::seed_from_u64(1);
        let generator = CavernGenerator::new(40, 30, 1);

        let result = generator
            .create(&mut level, &mut grid, &ConnectOptions::default(), &mut rng)
            .unwrap();

        assert!(result.is_none());
        assert!(grid.centers().is_empty());
    }
}
