//! # Generation Module
//!
//! Procedural dungeon layout: rooms, caverns and vaults on a scratch grid,
//! joined into one traversable space by tunnels.
//!
//! The stages build on each other in this order:
//! [`grid`] → [`rectangles`] → [`regions`] → [`connection`] → [`cavern`] →
//! [`dungeon`]. All of them share a single mutable [`GenerationGrid`] and an
//! injected RNG; nothing in the grid survives generation except what is
//! written to the [`Level`].

pub mod cavern;
pub mod connection;
pub mod dungeon;
pub mod grid;
pub mod rectangles;
pub mod regions;
pub mod town;

pub use cavern::*;
pub use connection::*;
pub use dungeon::*;
pub use grid::*;
pub use rectangles::*;
pub use regions::*;
pub use town::*;

use crate::{config, Level, WarrenError, WarrenResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// Parameters of the Angband-style wandering tunnel and the connection loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelParams {
    /// Percent chance per step that a free tunnel turns
    pub turn_pct: u32,
    /// Percent of turns that pick a random side instead of heading for the target
    pub random_direction_pct: u32,
    /// Straight cells a tunnel must run after turning before it may turn again
    pub min_tunnel_length: u32,
    /// Steps a free tunnel may take before it gives up
    pub free_tunnel_steps: u32,
    /// Steps the obstacle tracer may take before it gives up
    pub obstacle_steps: u32,
    /// Obstacles one wandering tunnel may go around before it gives up
    pub max_obstacles: u32,
    /// Tunnel attempts per connection pass
    pub connection_tries: u32,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            turn_pct: 30,
            random_direction_pct: 10,
            min_tunnel_length: 1,
            free_tunnel_steps: 1000,
            obstacle_steps: 1000,
            max_obstacles: 10,
            connection_tries: 100,
        }
    }
}

/// Parameters of the cost noise that shapes A* tunnels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Number of high-cost blocks scattered by block noise
    pub block_count: u32,
    /// Extra cost added by one block
    pub block_cost: RangeInclusive<u64>,
    /// Side length of one block
    pub block_size: RangeInclusive<i32>,
    /// Cells per Perlin noise period
    pub perlin_scale: f64,
    /// Largest cost Perlin noise adds to a cell
    pub perlin_amplitude: u64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            block_count: 300,
            block_cost: 100..=500,
            block_size: 1..=15,
            perlin_scale: 8.0,
            perlin_amplitude: 200,
        }
    }
}

/// Configuration for level generation.
///
/// Controls level size, which features are placed, their priorities, and how
/// the connection pass tunnels between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Dungeon depth; decides which special features appear
    pub depth: u32,
    /// Level width in cells
    pub width: i32,
    /// Level height in cells
    pub height: i32,
    /// Rooms attempted per level
    pub room_count: u32,
    /// Side length of a room, walls included
    pub room_size: RangeInclusive<i32>,
    /// Priority of the permanent border
    pub border_priority: u32,
    /// Priority of room cells
    pub room_priority: u32,
    /// Priority of stair cells
    pub stairs_priority: u32,
    /// Place a debug vault on depths divisible by this (0 disables)
    pub vault_every: u32,
    /// Vault size, walls included
    pub vault_width: i32,
    pub vault_height: i32,
    /// Priority of vault cells
    pub vault_priority: u32,
    /// Place a cavern on depths divisible by this (0 disables)
    pub cavern_every: u32,
    /// Cavern bounding box
    pub cavern_width: i32,
    pub cavern_height: i32,
    /// Priority of cavern cells
    pub cavern_priority: u32,
    /// Down staircases per level
    pub stairs_down: RangeInclusive<u32>,
    /// Up staircases per level
    pub stairs_up: RangeInclusive<u32>,
    /// Tunnel strategy for the level-wide connection pass
    pub tunnel_style: TunnelStyle,
    /// Cost noise applied before the level-wide connection pass
    pub noise: NoiseKind,
    /// Try Angband tunnels first and fall back to A* with random noise
    pub legacy_double_pass: bool,
    /// Wandering tunnel and retry budgets
    pub tunnels: TunnelParams,
    /// Cost noise shape
    pub noise_params: NoiseParams,
}

impl GenerationConfig {
    /// Creates the standard configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            depth: 1,
            width: config::DEFAULT_LEVEL_WIDTH,
            height: config::DEFAULT_LEVEL_HEIGHT,
            room_count: 15,
            room_size: 8..=14,
            border_priority: 10,
            room_priority: 2,
            stairs_priority: 8,
            vault_every: 12,
            vault_width: 50,
            vault_height: 40,
            vault_priority: 7,
            cavern_every: 5,
            cavern_width: 100,
            cavern_height: 80,
            cavern_priority: 1,
            stairs_down: 2..=4,
            stairs_up: 1..=3,
            tunnel_style: TunnelStyle::AStar,
            noise: NoiseKind::Block,
            legacy_double_pass: false,
            tunnels: TunnelParams::default(),
            noise_params: NoiseParams::default(),
        }
    }

    /// Creates a configuration for testing with small levels and no special features.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 60,
            height: 40,
            room_count: 6,
            room_size: 5..=9,
            vault_every: 0,
            cavern_every: 0,
            ..Self::new(seed)
        }
    }

    /// Creates a configuration that puts a cavern on every level.
    pub fn for_caverns(seed: u64) -> Self {
        Self {
            width: 80,
            height: 60,
            room_count: 6,
            vault_every: 0,
            cavern_every: 1,
            cavern_width: 40,
            cavern_height: 30,
            ..Self::new(seed)
        }
    }

    /// Checks that the configuration can produce a level.
    pub fn validate(&self) -> WarrenResult<()> {
        fn check(ok: bool, message: &str) -> WarrenResult<()> {
            if ok {
                Ok(())
            } else {
                Err(WarrenError::InvalidConfig(message.to_string()))
            }
        }

        check(self.width >= 10 && self.height >= 10, "level must be at least 10x10")?;
        check(!self.room_size.is_empty(), "room size range is empty")?;
        check(*self.room_size.start() >= 3, "rooms need at least one floor cell")?;
        check(
            *self.room_size.end() <= self.width - 2 && *self.room_size.end() <= self.height - 2,
            "rooms do not fit inside the border",
        )?;
        check(!self.stairs_down.is_empty(), "down stair range is empty")?;
        check(!self.stairs_up.is_empty(), "up stair range is empty")?;
        check(
            self.tunnels.turn_pct <= 100 && self.tunnels.random_direction_pct <= 100,
            "percentages must not exceed 100",
        )?;
        check(!self.noise_params.block_cost.is_empty(), "block cost range is empty")?;
        check(
            !self.noise_params.block_size.is_empty() && *self.noise_params.block_size.start() >= 1,
            "block size range is invalid",
        )?;
        check(
            *self.noise_params.block_size.end() < self.width - 1
                && *self.noise_params.block_size.end() < self.height - 1,
            "noise blocks do not fit inside the level",
        )?;
        check(self.noise_params.perlin_scale > 0.0, "perlin scale must be positive")?;
        if self.vault_every > 0 {
            check(
                self.vault_width >= 3
                    && self.vault_height >= 3
                    && self.vault_width <= self.width - 2
                    && self.vault_height <= self.height - 2,
                "vault does not fit inside the border",
            )?;
        }
        if self.cavern_every > 0 {
            check(
                self.cavern_width >= 3
                    && self.cavern_height >= 3
                    && self.cavern_width <= self.width - 2
                    && self.cavern_height <= self.height - 2,
                "cavern does not fit inside the border",
            )?;
        }
        Ok(())
    }

    /// Reads a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> WarrenResult<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to a JSON file.
    pub fn save(&self, path: &Path) -> WarrenResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// All level generators implement this trait, so callers can swap the
/// dungeon generator for the town generator without changing their loop.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> WarrenResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates that a level meets basic requirements.
    pub fn validate_level(level: &Level) -> WarrenResult<()> {
        if level.passable_count() == 0 {
            return Err(WarrenError::GenerationFailed(
                "Level has no passable tiles".to_string(),
            ));
        }

        if let Some(spawn) = level.player_spawn {
            let passable = level
                .terrain_at(spawn)
                .map(|terrain| terrain.is_passable())
                .unwrap_or(false);
            if !passable {
                return Err(WarrenError::GenerationFailed(format!(
                    "Player spawn {:?} is not passable",
                    spawn
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Terrain};
    use crate::MapSink;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.width, 120);
        assert_eq!(config.room_count, 15);
        assert_eq!(config.tunnel_style, TunnelStyle::AStar);
        assert_eq!(config.noise, NoiseKind::Block);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
        assert!(GenerationConfig::for_caverns(1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = GenerationConfig::for_testing(1);
        config.room_size = 9..=5;
        assert!(matches!(config.validate(), Err(WarrenError::InvalidConfig(_))));

        let mut config = GenerationConfig::for_testing(1);
        config.tunnels.turn_pct = 150;
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::for_testing(1);
        config.cavern_every = 1;
        config.cavern_width = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let config: GenerationConfig = serde_json::from_str(r#"{"seed": 9, "width": 80}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.width, 80);
        assert_eq!(config.height, 120);
        assert_eq!(config.tunnels, TunnelParams::default());
    }

    #[test]
    fn test_utils_rng_is_reproducible() {
        use rand::Rng;
        let config = GenerationConfig::new(12345);
        let mut a = utils::create_rng(&config);
        let mut b = utils::create_rng(&config);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn test_validate_level() {
        let mut level = Level::new(0, 10, 10);
        assert!(utils::validate_level(&level).is_err());

        level.clear_cell(Position::new(5, 5)).unwrap();
        assert!(utils::validate_level(&level).is_ok());

        level.player_spawn = Some(Position::new(1, 1));
        assert!(utils::validate_level(&level).is_err());

        level.place_terrain(Position::new(1, 1), Terrain::StairsUp).unwrap();
        assert!(utils::validate_level(&level).is_ok());
    }
}
