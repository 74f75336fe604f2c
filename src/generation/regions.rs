//! # Region Colouring
//!
//! Splits the clear cells of the grid into connected components ("colours").
//!
//! A [`ColorMap`] is the list of components found by flood fill, plus a
//! coordinate index so that looking up a cell's colour does not scan every
//! region. It lives for one connection pass and is rebuilt from the grid
//! whenever it is needed again.

use crate::{config, GenerationGrid, Position, Rect, WarrenError, WarrenResult};
use log::debug;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Disjoint connected regions of clear cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMap {
    regions: Vec<BTreeSet<Position>>,
    index: HashMap<Position, usize>,
}

impl ColorMap {
    /// Creates a map with no regions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[BTreeSet<Position>] {
        &self.regions
    }

    pub fn region(&self, color: usize) -> Option<&BTreeSet<Position>> {
        self.regions.get(color)
    }

    /// Index of the region containing `pos`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{ColorMap, Position};
    ///
    /// assert_eq!(ColorMap::new().color_for(Position::new(3, 4)), None);
    /// ```
    pub fn color_for(&self, pos: Position) -> Option<usize> {
        self.index.get(&pos).copied()
    }

    /// Appends a region. Cells that already have a colour are left where they are.
    pub fn push_region(&mut self, region: BTreeSet<Position>) {
        let color = self.regions.len();
        let region: BTreeSet<Position> = region
            .into_iter()
            .filter(|pos| !self.index.contains_key(pos))
            .collect();
        for &pos in &region {
            self.index.insert(pos, color);
        }
        self.regions.push(region);
    }

    /// Keeps only the regions for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&BTreeSet<Position>) -> bool,
    {
        self.regions.retain(|region| keep(region));
        self.reindex();
    }

    /// Merges the regions at both ends of a freshly carved tunnel and folds
    /// the tunnel's own cells into the result.
    ///
    /// The region count drops by exactly one. Tunnel cells that already
    /// belong to some third region stay in it, so regions remain disjoint.
    ///
    /// Both endpoints must already be coloured, in different regions.
    pub fn update(&mut self, tunnel: &[Position]) -> WarrenResult<()> {
        let (first, last) = match (tunnel.first(), tunnel.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(WarrenError::InvariantViolation(
                    "cannot merge regions along an empty tunnel".to_string(),
                ))
            }
        };

        let (start_color, end_color) = match (self.color_for(first), self.color_for(last)) {
            (Some(start), Some(end)) if start != end => (start, end),
            (start, end) => {
                return Err(WarrenError::InvariantViolation(format!(
                    "tunnel from {:?} (region {:?}) to {:?} (region {:?}) does not join two regions",
                    first, start, last, end
                )))
            }
        };

        let (low, high) = if start_color < end_color {
            (start_color, end_color)
        } else {
            (end_color, start_color)
        };
        let mut merged = self.regions.remove(high);
        merged.append(&mut self.regions.remove(low));

        for &pos in tunnel {
            match self.color_for(pos) {
                Some(color) if color != start_color && color != end_color => {}
                _ => {
                    merged.insert(pos);
                }
            }
        }

        self.regions.push(merged);
        self.reindex();
        Ok(())
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (color, region) in self.regions.iter().enumerate() {
            for &pos in region {
                self.index.insert(pos, color);
            }
        }
    }
}

/// Collects the clear cells connected to `start` through the 8-neighborhood.
///
/// Boundary cells are never followed, nor are cells outside `bounds` when it
/// is given. `start` itself is always part of the result. The fill stops
/// once the region holds `max_steps` cells.
pub fn get_connected_region(
    grid: &GenerationGrid,
    start: Position,
    bounds: Option<Rect>,
    max_steps: usize,
) -> BTreeSet<Position> {
    let mut region = BTreeSet::new();
    let mut queue = VecDeque::new();
    region.insert(start);
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        for adjacent in pos.adjacent_positions() {
            if region.len() >= max_steps {
                return region;
            }
            if region.contains(&adjacent) || !grid.is_in_bounds(adjacent) {
                continue;
            }
            if let Some(rect) = bounds {
                if !rect.contains(adjacent) {
                    continue;
                }
            }
            if grid.is_clear(adjacent) && !grid.is_boundary(adjacent) {
                region.insert(adjacent);
                queue.push_back(adjacent);
            }
        }
    }

    region
}

/// Colours the regions around a set of centers.
///
/// Returns the colour map with one region per center that was not already
/// swallowed by an earlier center's region, plus the set of centers that
/// were.
pub fn get_color_map(
    grid: &GenerationGrid,
    centers: &BTreeSet<Position>,
) -> (ColorMap, BTreeSet<Position>) {
    let mut color_map = ColorMap::new();
    let mut preconnected = BTreeSet::new();

    for &center in centers {
        if color_map.color_for(center).is_some() {
            preconnected.insert(center);
            continue;
        }
        let region = get_connected_region(grid, center, None, config::MAX_FLOOD_STEPS);
        color_map.push_region(region);
    }

    debug!(
        "{} centers coloured into {} regions",
        centers.len(),
        color_map.len()
    );
    (color_map, preconnected)
}

/// Colours every room cell inside a rectangle, without needing centers.
///
/// Flood fills never leave the rectangle.
pub fn get_color_map_for_area(grid: &GenerationGrid, rect: Rect) -> ColorMap {
    let mut color_map = ColorMap::new();
    for pos in rect.positions() {
        if !grid.is_in_bounds(pos) || !grid.is_room(pos) || color_map.color_for(pos).is_some() {
            continue;
        }
        let region = get_connected_region(grid, pos, Some(rect), config::MAX_FLOOD_STEPS);
        color_map.push_region(region);
    }
    color_map
}
