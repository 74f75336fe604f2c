//! Cost noise for shaping A* tunnels.
//!
//! Noise only ever raises costs, and only on cells that are not already
//! clear, so existing rooms and tunnels stay cheap to pass through.

use super::NoiseKind;
use crate::{GenerationGrid, NoiseParams, Position};
use noise::{NoiseFn, Perlin};
use log::debug;
use rand::Rng;

/// Adds noise of the given kind to every non-clear cell.
pub fn add_cost_noise<R: Rng + ?Sized>(
    grid: &mut GenerationGrid,
    kind: NoiseKind,
    params: &NoiseParams,
    rng: &mut R,
) {
    let width = grid.width();
    let height = grid.height();
    let noise = match kind {
        NoiseKind::None => return,
        NoiseKind::Random => random_noise(width, height, grid.default_cost(), rng),
        NoiseKind::Block => block_noise(width, height, params, rng),
        NoiseKind::Perlin => perlin_noise(width, height, params, rng),
    };
    debug!("adding {:?} cost noise", kind);

    for y in 0..height {
        for x in 0..width {
            let pos = Position::new(x, y);
            if grid.is_clear(pos) {
                continue;
            }
            grid.add_cost(pos, noise[(y * width + x) as usize]);
        }
    }
}

fn random_noise<R: Rng + ?Sized>(width: i32, height: i32, max: u64, rng: &mut R) -> Vec<u64> {
    (0..width * height).map(|_| rng.gen_range(0..=max)).collect()
}

/// Overlapping rectangles of raised cost, for long straight runs between turns.
fn block_noise<R: Rng + ?Sized>(
    width: i32,
    height: i32,
    params: &NoiseParams,
    rng: &mut R,
) -> Vec<u64> {
    let mut noise = vec![0u64; (width * height) as usize];

    for _ in 0..params.block_count {
        let block_width = rng.gen_range(params.block_size.clone());
        let block_height = rng.gen_range(params.block_size.clone());
        let cost = rng.gen_range(params.block_cost.clone());
        if block_width >= width || block_height >= height {
            continue;
        }
        let x_west = rng.gen_range(0..=width - block_width - 1);
        let y_north = rng.gen_range(0..=height - block_height - 1);

        for y in y_north..y_north + block_height {
            for x in x_west..x_west + block_width {
                noise[(y * width + x) as usize] += cost;
            }
        }
    }

    noise
}

/// Smooth noise in `0..=perlin_amplitude`, seeded from the injected RNG.
fn perlin_noise<R: Rng + ?Sized>(
    width: i32,
    height: i32,
    params: &NoiseParams,
    rng: &mut R,
) -> Vec<u64> {
    let perlin = Perlin::new(rng.gen::<u32>());
    let amplitude = params.perlin_amplitude as f64;
    let mut noise = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            let value = perlin.get([x as f64 / params.perlin_scale, y as f64 / params.perlin_scale]);
            let scaled = ((value + 1.0) / 2.0 * amplitude).round().clamp(0.0, amplitude);
            noise.push(scaled as u64);
        }
    }

    noise
}
