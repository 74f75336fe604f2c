//! # Warren
//!
//! Procedural dungeon layout and connectivity engine for roguelikes.
//!
//! ## Architecture Overview
//!
//! Generation runs in stages that all share one mutable scratch grid:
//!
//! - **Generation Grid**: per-cell cost, room/tunnel/pierceable flags and priority
//! - **Rectangles**: placement of free rectangles, hollow and filled carving
//! - **Regions**: flood-fill colouring of connected clear cells
//! - **Connection**: A* and Angband-style tunnels that join disjoint regions
//! - **Caverns**: cellular-automaton caves that connect themselves internally
//! - **Dungeon**: the level composer that assembles all of the above
//!
//! The finished layout is written to a [`Level`], the persistent map that
//! outlives generation. Every stage draws randomness from an injected RNG, so a
//! fixed seed reproduces an identical level.

pub mod generation;
pub mod map;
pub mod utils;

pub use generation::*;
pub use map::*;

/// Core error type for the Warren generation engine.
#[derive(thiserror::Error, Debug)]
pub enum WarrenError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration is inconsistent or unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Access outside the level
    #[error("Position ({x}, {y}) is outside the level")]
    OutOfBounds { x: i32, y: i32 },

    /// Generation could not produce a required piece
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Internal generation state is inconsistent
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type used throughout the Warren codebase.
pub type WarrenResult<T> = Result<T, WarrenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation constants.
pub mod config {
    /// Default level width in cells
    pub const DEFAULT_LEVEL_WIDTH: i32 = 120;

    /// Default level height in cells
    pub const DEFAULT_LEVEL_HEIGHT: i32 = 120;

    /// Background tunneling cost of an untouched cell
    pub const DEFAULT_COST: u64 = 20;

    /// Tunneling cost written by rectangle carving unless overridden
    pub const RECTANGLE_COST: u64 = 10;

    /// Tunneling cost of the permanent level border
    pub const PERMANENT_WALL_COST: u64 = 10_000_000_000;

    /// Tunneling cost of vault walls
    pub const VAULT_WALL_COST: u64 = 10_000;

    /// Flood fill gives up after this many cells
    pub const MAX_FLOOD_STEPS: usize = 10_000;

    /// Random attempts made by rectangle placement
    pub const RECTANGLE_PLACEMENT_TRIES: u32 = 10;

    /// Random attempts made when looking for a cell matching a filter
    pub const RANDOM_CELL_TRIES: u32 = 1000;
}
