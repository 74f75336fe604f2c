//! # Dungeon Generation
//!
//! The level composer: builds a complete Angband-style level on one grid.
//!
//! A level is assembled in a fixed order. The permanent border and granite
//! background go down first, then the optional vault and cavern, then the
//! rooms. A single connection pass joins everything, and stairs, the player
//! spawn and the populator come last. Later features can only overwrite
//! cells of strictly lower priority, so the order above is also the order
//! of precedence for anything placed at the same priority.

use crate::generation::utils;
use crate::{
    config, connect_rooms, find_placeable_rectangle, make_rectangle_filled, make_rectangle_hollow,
    remove_centers_in_rectangle, CavernGenerator, CellFilter, CellUpdate, ConnectOptions,
    GenerationConfig, GenerationGrid, Generator, Level, MapSink, NoiseKind, Position, Rect,
    RectangleOptions, Terrain, TunnelStyle, WarrenError, WarrenResult,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;

/// Hand-off point for scattering creatures and items over a finished layout.
///
/// Called once per level, after stairs are placed and before validation.
pub trait Populator {
    fn populate(
        &self,
        level: &mut Level,
        grid: &GenerationGrid,
        rng: &mut StdRng,
    ) -> WarrenResult<()>;
}

/// Populator that leaves the level empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPopulator;

impl Populator for NoPopulator {
    fn populate(&self, _: &mut Level, _: &GenerationGrid, _: &mut StdRng) -> WarrenResult<()> {
        Ok(())
    }
}

/// A finished level together with the grid it was built on.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLevel {
    pub level: Level,
    pub grid: GenerationGrid,
    /// Whether the connection pass joined every center into one region
    pub connected: bool,
}

/// Rooms, vaults and caverns joined by tunnels.
///
/// Generation never fails just because the layout came out disconnected;
/// check [`GeneratedLevel::connected`] and regenerate if that matters.
#[derive(Debug, Clone)]
pub struct AngbandLevelGenerator<P: Populator = NoPopulator> {
    /// Called on every finished level
    pub populator: P,
    /// Whether stairs are placed at all
    pub place_stairs: bool,
}

impl AngbandLevelGenerator<NoPopulator> {
    /// Creates a level generator that places no creatures or items.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::generation::utils;
    /// use warren::{AngbandLevelGenerator, GenerationConfig, Generator};
    ///
    /// let config = GenerationConfig::for_testing(7);
    /// let mut rng = utils::create_rng(&config);
    /// let generated = AngbandLevelGenerator::new().generate(&config, &mut rng).unwrap();
    /// assert_eq!(generated.level.width, 60);
    /// ```
    pub fn new() -> Self {
        Self::with_populator(NoPopulator)
    }

    /// Creates a generator for bare layouts without stairs.
    pub fn for_testing() -> Self {
        Self {
            populator: NoPopulator,
            place_stairs: false,
        }
    }
}

impl<P: Populator> AngbandLevelGenerator<P> {
    /// Creates a level generator that hands every level to `populator`.
    pub fn with_populator(populator: P) -> Self {
        Self {
            populator,
            place_stairs: true,
        }
    }

    fn build(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<GeneratedLevel> {
        config.validate()?;
        info!(
            "generating depth {} level ({}x{}, seed {})",
            config.depth, config.width, config.height, config.seed
        );

        let mut level = Level::new(config.depth, config.width, config.height);
        let mut grid = GenerationGrid::new(config.width, config.height);
        let options = ConnectOptions::from_config(config);

        make_border(&mut level, &mut grid, config.border_priority)?;

        if is_due(config.depth, config.vault_every) {
            make_debug_vault(
                &mut level,
                &mut grid,
                config.vault_width,
                config.vault_height,
                config.vault_priority,
                rng,
            )?;
        }
        if is_due(config.depth, config.cavern_every) {
            CavernGenerator::from_config(config).create(&mut level, &mut grid, &options, rng)?;
        }

        let mut rooms = 0;
        for _ in 0..config.room_count {
            if make_room(&mut level, &mut grid, config.room_priority, &config.room_size, rng)?
                .is_some()
            {
                rooms += 1;
            }
        }
        debug!("placed {} of {} rooms", rooms, config.room_count);

        let connected = if config.legacy_double_pass {
            let first = connect_rooms(
                &mut level,
                &mut grid,
                &options.with(TunnelStyle::Angband, NoiseKind::None),
                None,
                rng,
            )?;
            if first && grid.vault_centers().is_empty() {
                true
            } else {
                connect_rooms(
                    &mut level,
                    &mut grid,
                    &options.with(TunnelStyle::AStar, NoiseKind::Random),
                    None,
                    rng,
                )?
            }
        } else {
            connect_rooms(&mut level, &mut grid, &options, None, rng)?
        };

        if self.place_stairs {
            let down = rng.gen_range(config.stairs_down.clone());
            let up = rng.gen_range(config.stairs_up.clone());
            let stairs = (0..down)
                .map(|_| Terrain::StairsDown)
                .chain((0..up).map(|_| Terrain::StairsUp));
            for terrain in stairs {
                if let Err(err) =
                    place_terrain_in_room(&mut level, &mut grid, terrain, config.stairs_priority, rng)
                {
                    warn!("skipping {:?}: {}", terrain, err);
                }
            }
        }

        level.player_spawn = grid.random_center(rng);
        self.populator.populate(&mut level, &grid, rng)?;

        info!(
            "depth {} level finished: {} passable cells, {} down / {} up stairs, connected: {}",
            config.depth,
            level.passable_count(),
            level.stairs_down.len(),
            level.stairs_up.len(),
            connected
        );
        Ok(GeneratedLevel {
            level,
            grid,
            connected,
        })
    }
}

impl<P: Populator> Generator<GeneratedLevel> for AngbandLevelGenerator<P> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<GeneratedLevel> {
        let generated = self.build(config, rng)?;
        self.validate(&generated, config)?;
        Ok(generated)
    }

    fn validate(&self, content: &GeneratedLevel, config: &GenerationConfig) -> WarrenResult<()> {
        if content.level.width != config.width || content.level.height != config.height {
            return Err(WarrenError::GenerationFailed(format!(
                "level is {}x{}, expected {}x{}",
                content.level.width, content.level.height, config.width, config.height
            )));
        }
        utils::validate_level(&content.level)
    }

    fn generator_type(&self) -> &'static str {
        "AngbandLevelGenerator"
    }
}

impl Default for AngbandLevelGenerator<NoPopulator> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_due(depth: u32, every: u32) -> bool {
    every > 0 && depth % every == 0
}

/// Rings the level with permanent wall and fills the rest with granite.
///
/// The border is practically untunnelable; the background keeps the
/// ordinary rectangle cost so tunnels cross it freely.
pub fn make_border<M: MapSink + ?Sized>(
    map: &mut M,
    grid: &mut GenerationGrid,
    priority: u32,
) -> WarrenResult<()> {
    let bounds = Rect::new(0, 0, grid.width(), grid.height());
    make_rectangle_hollow(
        map,
        grid,
        bounds,
        Some(Terrain::PermanentWall),
        &RectangleOptions {
            priority,
            cost: config::PERMANENT_WALL_COST,
            ..Default::default()
        },
    )?;
    make_rectangle_filled(
        map,
        grid,
        bounds.inset(1),
        Some(Terrain::GraniteWall),
        &RectangleOptions::default(),
    )
}

/// Places one room of random size.
///
/// The room gets granite walls that later tunnels may pierce, a cleared
/// interior at zero cost, and a center. Centers of older features under the
/// room are dropped. Returns None if no spot was free.
pub fn make_room<M, R>(
    map: &mut M,
    grid: &mut GenerationGrid,
    priority: u32,
    size: &RangeInclusive<i32>,
    rng: &mut R,
) -> WarrenResult<Option<Rect>>
where
    M: MapSink + ?Sized,
    R: Rng + ?Sized,
{
    let width = rng.gen_range(size.clone());
    let height = rng.gen_range(size.clone());
    let rect = match find_placeable_rectangle(grid, width, height, priority, None, None, rng) {
        Some(corner) => Rect::at(corner, width, height),
        None => {
            warn!("no room for a {}x{} room", width, height);
            return Ok(None);
        }
    };

    remove_centers_in_rectangle(grid, rect);
    grid.add_center(rect.center());

    make_rectangle_hollow(
        map,
        grid,
        rect,
        Some(Terrain::GraniteWall),
        &RectangleOptions {
            priority,
            is_pierceable: true,
            ..Default::default()
        },
    )?;
    make_rectangle_filled(
        map,
        grid,
        rect.inset(1),
        None,
        &RectangleOptions {
            priority,
            is_room: true,
            cost: 0,
            ..Default::default()
        },
    )?;

    debug!("room {}x{} at ({}, {})", width, height, rect.x_west, rect.y_north);
    Ok(Some(rect))
}

/// Places an empty vault walled in permanent rock.
///
/// The only way in is a zero-cost door cell in the middle of the west
/// wall. The cell just inside it is registered both as a center and as a
/// vault center, so A* connection tunnels in through the door while the
/// Angband style leaves the vault alone.
pub fn make_debug_vault<M, R>(
    map: &mut M,
    grid: &mut GenerationGrid,
    width: i32,
    height: i32,
    priority: u32,
    rng: &mut R,
) -> WarrenResult<Option<Rect>>
where
    M: MapSink + ?Sized,
    R: Rng + ?Sized,
{
    let rect = match find_placeable_rectangle(grid, width, height, priority, None, None, rng) {
        Some(corner) => Rect::at(corner, width, height),
        None => {
            warn!("no room for a {}x{} vault", width, height);
            return Ok(None);
        }
    };

    remove_centers_in_rectangle(grid, rect);
    make_rectangle_hollow(
        map,
        grid,
        rect,
        Some(Terrain::PermanentWall),
        &RectangleOptions {
            priority,
            cost: config::VAULT_WALL_COST,
            ..Default::default()
        },
    )?;
    make_rectangle_filled(
        map,
        grid,
        rect.inset(1),
        None,
        &RectangleOptions {
            priority,
            cost: 0,
            ..Default::default()
        },
    )?;

    let door = Position::new(rect.x_west, rect.y_north + height / 2);
    grid.set_cost(door, 0);
    let center = Position::new(door.x + 1, door.y);
    grid.add_center(center);
    grid.add_vault_center(center);

    info!("vault {}x{} at ({}, {})", width, height, rect.x_west, rect.y_north);
    Ok(Some(rect))
}

/// Puts terrain on a random room cell and claims the cell at `priority`.
///
/// The claimed cell stops being a room cell, so repeated calls never pick
/// the same spot.
pub fn place_terrain_in_room<M, R>(
    map: &mut M,
    grid: &mut GenerationGrid,
    terrain: Terrain,
    priority: u32,
    rng: &mut R,
) -> WarrenResult<Position>
where
    M: MapSink + ?Sized,
    R: Rng + ?Sized,
{
    let pos = grid.random_cell(
        rng,
        CellFilter {
            room: true,
            pierceable: false,
        },
    )?;
    map.place_terrain(pos, terrain)?;
    grid.set_grid_info(
        pos,
        CellUpdate {
            priority,
            ..Default::default()
        },
    );
    Ok(pos)
}
