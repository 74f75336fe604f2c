//! Fixed town level used for debugging movement and rendering.

use crate::generation::utils;
use crate::{
    make_rectangle_filled, make_rectangle_hollow, GenerationConfig, GenerationGrid, GeneratedLevel,
    Generator, Level, MapSink, Position, Rect, RectangleOptions, Terrain, WarrenResult,
};
use log::info;
use rand::rngs::StdRng;

/// Open walled field with a down staircase in the corner and a grid of
/// small pillars to walk around. Uses no randomness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownGenerator {
    /// Distance between neighbouring pillars
    pub pillar_spacing: i32,
    /// Pillar-free strip along every edge
    pub pillar_margin: i32,
    pub spawn: Position,
}

impl TownGenerator {
    pub fn new() -> Self {
        Self {
            pillar_spacing: 4,
            pillar_margin: 20,
            spawn: Position::new(4, 4),
        }
    }

    /// Top-left cells of the 2×2 pillars on a level of the given size.
    pub fn pillar_positions(&self, width: i32, height: i32) -> Vec<Position> {
        let step = self.pillar_spacing.max(1) as usize;
        let mut pillars = Vec::new();
        for x in (self.pillar_margin..width - self.pillar_margin).step_by(step) {
            for y in (self.pillar_margin..height - self.pillar_margin).step_by(step) {
                pillars.push(Position::new(x, y));
            }
        }
        pillars
    }
}

impl Default for TownGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<GeneratedLevel> for TownGenerator {
    fn generate(&self, config: &GenerationConfig, _rng: &mut StdRng) -> WarrenResult<GeneratedLevel> {
        config.validate()?;
        let mut level = Level::new(0, config.width, config.height);
        let mut grid = GenerationGrid::new(config.width, config.height);

        let bounds = Rect::new(0, 0, config.width, config.height);
        make_rectangle_hollow(
            &mut level,
            &mut grid,
            bounds,
            Some(Terrain::PermanentWall),
            &RectangleOptions {
                priority: config.border_priority,
                ..Default::default()
            },
        )?;
        make_rectangle_filled(
            &mut level,
            &mut grid,
            bounds.inset(1),
            None,
            &RectangleOptions::default(),
        )?;

        level.place_terrain(Position::new(1, 1), Terrain::StairsDown)?;

        let pillars = self.pillar_positions(config.width, config.height);
        for &corner in &pillars {
            for pos in Rect::at(corner, 2, 2).positions() {
                level.place_terrain(pos, Terrain::GraniteWall)?;
            }
        }

        if level.terrain_at(self.spawn).map_or(false, Terrain::is_passable) {
            level.player_spawn = Some(self.spawn);
        }

        info!("town level {}x{} with {} pillars", config.width, config.height, pillars.len());
        let generated = GeneratedLevel {
            level,
            grid,
            connected: true,
        };
        self.validate(&generated, config)?;
        Ok(generated)
    }

    fn validate(&self, content: &GeneratedLevel, _config: &GenerationConfig) -> WarrenResult<()> {
        utils::validate_level(&content.level)
    }

    fn generator_type(&self) -> &'static str {
        "TownGenerator"
    }
}
