//! Fractal noise synthesis of height grids
//!
//! Heights are the sum of `octaves` layers of Perlin noise at increasing
//! frequency (`lacunarity^i`) and decreasing amplitude (`persistence^i`). Each
//! octave samples the noise plane at its own offset, drawn from a seeded
//! ChaCha stream so the same seed always yields the same terrain on every
//! platform.
//!
//! Two normalization modes are supported:
//! - [`NormalizeMode::Local`] remaps the observed extremes of one grid to
//!   `[0, 1]`. Adjacent chunks normalized this way do not line up.
//! - [`NormalizeMode::Global`] divides by the theoretical amplitude sum scaled
//!   by [`GLOBAL_NORMALIZATION_FACTOR`], so heights are comparable across
//!   chunks. Values are clamped at 0 but have no upper clamp.

use glam::DVec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::height_grid::HeightGrid;
use crate::core::error::ConfigError;
use crate::core::types::Vec2;
use crate::core::updatable::Validate;

/// Smallest scale the sampler divides by
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Empirical divisor applied to the amplitude sum in global mode
pub const GLOBAL_NORMALIZATION_FACTOR: f32 = 1.65;

/// Octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`
pub const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Seed of the underlying Perlin permutation table. Terrain variety comes from
/// the octave offsets, not from this seed.
const BASE_NOISE_SEED: u32 = 0;

/// How raw fractal sums are mapped to heights
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Per-grid min/max remap to [0, 1]
    Local,
    /// Remap by theoretical maximum; consistent across chunks
    #[default]
    Global,
}

/// Parameters of the fractal noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: u32,
    pub offset: Vec2,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub octaves: u32,
    pub lacunarity: f32,   // Frequency multiplier per octave
    pub persistence: f32,  // Amplitude multiplier per octave
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            offset: Vec2::ZERO,
            scale: 50.0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            normalize_mode: NormalizeMode::Global,
        }
    }
}

impl NoiseConfig {
    /// Sum of all octave amplitudes, the largest magnitude a raw sample can reach
    pub fn max_possible_height(&self) -> f32 {
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }

    /// Copy of this config shifted by `center` in world space
    pub fn centered_at(&self, center: Vec2) -> Self {
        Self {
            offset: self.offset + center,
            ..self.clone()
        }
    }
}

impl Validate for NoiseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if self.octaves == 0 {
            return Err(ConfigError::ZeroOctaves);
        }
        if !(self.lacunarity.is_finite() && self.lacunarity >= 1.0) {
            return Err(ConfigError::InvalidLacunarity(self.lacunarity));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(ConfigError::InvalidPersistence(self.persistence));
        }
        Ok(())
    }
}

/// Per-octave sample offsets for `config`.
///
/// Each octave draws its X shift (plus `offset.x`) and then its Y shift
/// (minus `offset.y`) from one sequential stream, so the offsets of octave `i`
/// depend only on the seed and the octaves before it, never on the octave count.
pub fn octave_offsets(config: &NoiseConfig) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(config.seed));
    (0..config.octaves)
        .map(|_| {
            let dx = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            let dy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            DVec2::new(
                f64::from(dx) + f64::from(config.offset.x),
                f64::from(dy) - f64::from(config.offset.y),
            )
        })
        .collect()
}

/// Deterministic fractal noise sampler
#[derive(Clone, Debug)]
pub struct NoiseField {
    perlin: Perlin,
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseField {
    pub fn new() -> Self {
        Self {
            perlin: Perlin::new(BASE_NOISE_SEED),
        }
    }

    /// Continuous 2D noise in [0, 1]
    #[inline]
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let value = self.perlin.get([x, y]);
        ((value + 1.0) * 0.5).clamp(0.0, 1.0) as f32
    }

    /// Generate a `size * size` height grid.
    ///
    /// Identical inputs always produce a bit-identical grid.
    pub fn generate(&self, size: usize, config: &NoiseConfig) -> HeightGrid {
        let offsets = octave_offsets(config);
        let scale = f64::from(config.scale.max(MIN_NOISE_SCALE));
        let half = (size / 2) as f64;

        let mut grid = HeightGrid::new(size);
        grid.values_mut()
            .par_chunks_mut(size.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = self.fractal_sample(x as f64 - half, y as f64 - half, &offsets, scale, config);
                }
            });

        normalize(&mut grid, config);
        grid
    }

    fn fractal_sample(&self, x: f64, y: f64, offsets: &[DVec2], scale: f64, config: &NoiseConfig) -> f32 {
        let mut frequency = 1.0_f64;
        let mut amplitude = 1.0_f32;
        let mut height = 0.0_f32;

        for offset in offsets {
            let sample_x = (x + offset.x) / scale * frequency;
            let sample_y = (y + offset.y) / scale * frequency;

            let value = self.sample(sample_x, sample_y) * 2.0 - 1.0;
            height += value * amplitude;

            frequency *= f64::from(config.lacunarity);
            amplitude *= config.persistence;
        }

        height
    }
}

fn normalize(grid: &mut HeightGrid, config: &NoiseConfig) {
    let (min, max) = grid.min_max();

    match config.normalize_mode {
        NormalizeMode::Local => {
            let range = max - min;
            grid.values_mut().par_iter_mut().for_each(|v| {
                *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
            });
        }
        NormalizeMode::Global => {
            let divisor = 2.0 * config.max_possible_height() / GLOBAL_NORMALIZATION_FACTOR;
            log::trace!("Global normalization: observed [{min}, {max}], divisor {divisor}");
            grid.values_mut().par_iter_mut().for_each(|v| {
                *v = ((*v + 1.0) / divisor).max(0.0);
            });
        }
    }
}
