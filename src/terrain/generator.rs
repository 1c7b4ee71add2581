//! Chunk height grids and meshes from a validated configuration

use std::sync::Arc;

use glam::Vec2;

use super::config::TerrainConfig;
use super::curve::HeightCurve;
use super::falloff::FalloffMask;
use super::height_grid::HeightGrid;
use super::noise_field::NoiseField;
use crate::core::types::Result;
use crate::core::updatable::Validate;
use crate::mesh::{GeometryBuffer, MeshBuilder};

/// Binds a terrain configuration to the noise field, falloff mask and mesh builder.
///
/// Shared between the coordinator and the worker pool behind an `Arc`; every
/// method takes `&self` and is safe to call from any thread.
pub struct TerrainGenerator {
    config: TerrainConfig,
    noise: NoiseField,
    falloff: Option<FalloffMask>,
    mesh_builder: MeshBuilder,
}

impl TerrainGenerator {
    /// Validate `config` and precompute the falloff mask if enabled
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;

        let grid_size = config.terrain.grid_size();
        let falloff = config.terrain.use_falloff.then(|| FalloffMask::generate(grid_size));
        let mesh_builder = MeshBuilder::new(
            config.terrain.height_multiplier,
            Arc::new(config.terrain.height_curve.clone()),
            config.terrain.flat_shading,
        );

        log::debug!(
            "Terrain generator: seed {}, chunk size {}, {} LOD levels, falloff {}",
            config.noise.seed,
            config.terrain.chunk_size(),
            config.lods.len(),
            config.terrain.use_falloff
        );

        Ok(Self {
            config,
            noise: NoiseField::new(),
            falloff,
            mesh_builder,
        })
    }

    /// Replace the configured keyframe curve with an arbitrary one
    pub fn with_height_curve(mut self, curve: Arc<dyn HeightCurve>) -> Self {
        self.mesh_builder = MeshBuilder::new(
            self.config.terrain.height_multiplier,
            curve,
            self.config.terrain.flat_shading,
        );
        self
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn mesh_builder(&self) -> &MeshBuilder {
        &self.mesh_builder
    }

    pub fn chunk_size(&self) -> usize {
        self.config.terrain.chunk_size()
    }

    pub fn grid_size(&self) -> usize {
        self.config.terrain.grid_size()
    }

    /// Distance between adjacent chunk centers in chunk space
    pub fn chunk_stride(&self) -> f32 {
        self.config.terrain.chunk_stride()
    }

    /// Height grid of the chunk centered at `center` (chunk space)
    pub fn height_grid(&self, center: Vec2) -> HeightGrid {
        let noise = self.config.noise.centered_at(center);
        let mut grid = self.noise.generate(self.grid_size(), &noise);

        if let Some(falloff) = &self.falloff {
            falloff.apply(&mut grid, self.config.terrain.falloff_strength);
        }
        grid
    }

    /// Mesh a height grid at the given simplification level
    pub fn mesh(&self, grid: &HeightGrid, simplification_level: u32) -> Result<GeometryBuffer> {
        self.mesh_builder.build(grid, simplification_level)
    }

    /// Build a single chunk at the origin without streaming
    pub fn preview(&self, simplification_level: u32) -> Result<(HeightGrid, GeometryBuffer)> {
        let grid = self.height_grid(Vec2::ZERO);
        let mesh = self.mesh(&grid, simplification_level)?;
        log::info!(
            "Preview at LOD {}: {} vertices, {} triangles",
            simplification_level,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok((grid, mesh))
    }

    /// Lowest surface height in world units
    pub fn min_height(&self) -> f32 {
        self.height_at_curve(0.0)
    }

    /// Highest surface height in world units
    pub fn max_height(&self) -> f32 {
        self.height_at_curve(1.0)
    }

    fn height_at_curve(&self, t: f32) -> f32 {
        self.config.terrain.uniform_scale
            * self.config.terrain.height_multiplier
            * self.mesh_builder.height_curve().evaluate(t)
    }
}
