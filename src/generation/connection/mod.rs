//! # Connection
//!
//! Joins disjoint regions of the grid with tunnels until one region remains.
//!
//! The loop colours the regions, optionally roughens the cost field with
//! noise, then repeatedly picks two regions at random and asks a tunnel
//! strategy for a path between a close pair of their cells. Every tunnel
//! that lands is carved into the real map and merges two colours, so each
//! success lowers the region count by exactly one.

pub mod angband;
pub mod astar;
pub mod cost_noise;

pub use angband::*;
pub use astar::*;
pub use cost_noise::*;

use crate::utils::closest_points;
use crate::{
    get_color_map, GenerationConfig, GenerationGrid, MapSink, NoiseParams, Position, TunnelParams,
    WarrenResult,
};
use log::{debug, info, warn};
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Priority at which tunnels claim cells and test for obstacles.
pub const TUNNEL_PRIORITY: u32 = 1;

/// How tunnels between two regions are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelStyle {
    /// Cheapest path over the cost field
    #[default]
    AStar,
    /// Wandering tunnel that traces around obstacles; ignores vaults
    Angband,
}

/// Cost noise added before tunneling to vary tunnel shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    None,
    /// Independent per-cell noise; many short wiggles
    Random,
    /// Overlapping rectangles of raised cost; long straight runs
    #[default]
    Block,
    /// Coherent Perlin noise; gently curving tunnels
    Perlin,
}

/// Everything a connection pass needs besides the grid and map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectOptions {
    pub style: TunnelStyle,
    pub noise: NoiseKind,
    pub tunnels: TunnelParams,
    pub noise_params: NoiseParams,
}

impl ConnectOptions {
    /// Connection settings of a level configuration.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            style: config.tunnel_style,
            noise: config.noise,
            tunnels: config.tunnels.clone(),
            noise_params: config.noise_params.clone(),
        }
    }

    /// The same settings with another style and noise.
    pub fn with(&self, style: TunnelStyle, noise: NoiseKind) -> Self {
        Self {
            style,
            noise,
            ..self.clone()
        }
    }
}

/// Connects regions until one remains or the try budget runs out.
///
/// `unconnected` defaults to every center on the grid. The Angband style
/// never tries to reach vault centers. Returns whether everything ended up
/// in a single region; running out of tries is not an error.
pub fn connect_rooms<M, R>(
    map: &mut M,
    grid: &mut GenerationGrid,
    options: &ConnectOptions,
    unconnected: Option<&BTreeSet<Position>>,
    rng: &mut R,
) -> WarrenResult<bool>
where
    M: MapSink + ?Sized,
    R: Rng + ?Sized,
{
    let mut locations = unconnected
        .cloned()
        .unwrap_or_else(|| grid.centers().clone());
    if options.style == TunnelStyle::Angband {
        locations = locations
            .difference(grid.vault_centers())
            .copied()
            .collect();
    }

    let (mut color_map, preconnected) = get_color_map(grid, &locations);
    debug!(
        "{} regions detected, {} locations already connected",
        color_map.len(),
        preconnected.len()
    );
    if color_map.len() < 2 {
        return Ok(true);
    }

    add_cost_noise(grid, options.noise, &options.noise_params, rng);

    let mut tries = 1;
    let mut tunnels = 0;
    while color_map.len() > 1 && tries < options.tunnels.connection_tries {
        tries += 1;

        let picked = sample(rng, color_map.len(), 2);
        let (start_color, target_color) = (picked.index(0), picked.index(1));
        let endpoints = match (color_map.region(start_color), color_map.region(target_color)) {
            (Some(a), Some(b)) => closest_points(a, b, rng),
            _ => None,
        };
        let (start, end) = match endpoints {
            Some(points) => points,
            None => continue,
        };

        let tunnel = match options.style {
            TunnelStyle::AStar => get_astar_tunnel(grid, &color_map, start, end, start_color),
            TunnelStyle::Angband => get_angband_tunnel(
                grid,
                &color_map,
                start,
                end,
                start_color,
                &options.tunnels,
                rng,
            ),
        };
        if tunnel.is_empty() {
            continue;
        }

        debug!(
            "tunnel from {:?} to {:?}, {} cells",
            tunnel[0],
            tunnel[tunnel.len() - 1],
            tunnel.len()
        );
        construct_tunnel_from_path(map, grid, &tunnel, TUNNEL_PRIORITY)?;
        color_map.update(&tunnel)?;
        tunnels += 1;
    }

    let connected = color_map.len() <= 1;
    if connected {
        info!(
            "{:?} connection finished with {} tunnels in {} tries",
            options.style, tunnels, tries
        );
    } else {
        warn!(
            "{:?} connection gave up with {} regions left after {} tries",
            options.style,
            color_map.len(),
            tries
        );
    }
    Ok(connected)
}

/// Carves a tunnel path into the real map and records it on the grid.
///
/// Room cells along the path are left alone. Cells where the tunnel meets
/// an older tunnel or touches a room become junctions, and the rock beside
/// the tunnel becomes pierceable so later wandering tunnels can join it.
pub fn construct_tunnel_from_path<M: MapSink + ?Sized>(
    map: &mut M,
    grid: &mut GenerationGrid,
    path: &[Position],
    priority: u32,
) -> WarrenResult<()> {
    let len = path.len();
    for (i, &pos) in path.iter().enumerate() {
        if grid.is_room(pos) {
            continue;
        }
        if grid.is_tunnel(pos) {
            grid.add_junction(pos);
        }

        map.clear_cell(pos)?;
        grid.set_tunnel(pos, true);

        // Skip the two cells at either end
        if i > 1 && i + 2 < len {
            let previous = path[i - 1];
            let next = path[i + 1];
            if grid.is_room(previous) || grid.is_room(next) {
                grid.add_junction(pos);
            }
            for wall in pos.cardinal_adjacent_positions() {
                if wall != previous && wall != next && grid.is_in_bounds(wall) {
                    grid.set_pierceable(wall, true, priority);
                }
            }
        }
    }
    Ok(())
}
