//! Terrain configuration loaded once at startup

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::curve::KeyframeCurve;
use super::noise_field::NoiseConfig;
use crate::core::error::ConfigError;
use crate::core::types::Result;
use crate::core::updatable::Validate;
use crate::mesh::builder::{is_step_aligned, simplification_step};
use crate::streaming::lod::LodTable;

/// Chunk size used with smooth shading when none is configured
pub const DEFAULT_CHUNK_SIZE: usize = 239;

/// Chunk size used with flat shading (three vertices per triangle) when none is configured
pub const DEFAULT_FLAT_CHUNK_SIZE: usize = 95;

/// Parameters controlling how height grids become meshes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub flat_shading: bool,
    pub use_falloff: bool,
    pub falloff_strength: f32,
    pub height_multiplier: f32, // Vertical scale (max height before curve)
    pub height_curve: KeyframeCurve,
    pub uniform_scale: f32,     // World units per mesh unit
    /// Logical chunk size; `None` picks a default from the shading mode
    pub chunk_size: Option<usize>,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            flat_shading: false,
            use_falloff: false,
            falloff_strength: 1.0,
            height_multiplier: 30.0,
            height_curve: KeyframeCurve::linear(),
            uniform_scale: 1.0,
            chunk_size: None,
        }
    }
}

impl TerrainSettings {
    /// Logical chunk size in cells
    pub fn chunk_size(&self) -> usize {
        match self.chunk_size {
            Some(size) => size,
            None if self.flat_shading => DEFAULT_FLAT_CHUNK_SIZE,
            None => DEFAULT_CHUNK_SIZE,
        }
    }

    /// Side of the height grid, including the border ring
    pub fn grid_size(&self) -> usize {
        self.chunk_size() + 2
    }

    /// World distance between adjacent chunk centers, before uniform scale
    pub fn chunk_stride(&self) -> f32 {
        (self.chunk_size() - 1) as f32
    }
}

impl Validate for TerrainSettings {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.falloff_strength) {
            return Err(ConfigError::InvalidFalloffStrength(self.falloff_strength));
        }
        if !(self.uniform_scale.is_finite() && self.uniform_scale > 0.0) {
            return Err(ConfigError::InvalidUniformScale(self.uniform_scale));
        }
        if self.chunk_size() < 2 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size()));
        }
        self.height_curve.validate()
    }
}

/// Worker pool and update cadence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Viewer movement (in chunk space) that triggers a visible-window refresh
    pub viewer_move_threshold: f32,
    /// Maximum concurrent generation jobs
    pub max_workers: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            viewer_move_threshold: 25.0,
            max_workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
        }
    }
}

impl Validate for StreamingSettings {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if !(self.viewer_move_threshold.is_finite() && self.viewer_move_threshold >= 0.0) {
            return Err(ConfigError::InvalidMoveThreshold(self.viewer_move_threshold));
        }
        Ok(())
    }
}

/// Complete configuration surface of the terrain system
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub noise: NoiseConfig,
    pub terrain: TerrainSettings,
    pub lods: LodTable,
    pub streaming: StreamingSettings,
}

impl TerrainConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Validate for TerrainConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.noise.validate()?;
        self.terrain.validate()?;
        self.lods.validate()?;
        self.streaming.validate()?;

        let grid_size = self.terrain.grid_size();
        for lod in self.lods.levels() {
            let step = simplification_step(lod.level);
            if !is_step_aligned(grid_size, step) {
                return Err(ConfigError::UnalignedLod { level: lod.level, step, grid_size });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::lod::LodLevel;

    #[test]
    fn test_default_config_is_valid() {
        let config = TerrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.terrain.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.terrain.grid_size(), 241);
        assert_eq!(config.terrain.chunk_stride(), 238.0);
    }

    #[test]
    fn test_flat_shading_uses_smaller_chunks() {
        let settings = TerrainSettings { flat_shading: true, ..Default::default() };
        assert_eq!(settings.chunk_size(), DEFAULT_FLAT_CHUNK_SIZE);

        let config = TerrainConfig { terrain: settings, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unaligned_lod() {
        let config = TerrainConfig {
            terrain: TerrainSettings { chunk_size: Some(24), ..Default::default() },
            lods: LodTable::new(vec![
                LodLevel::new(0, 100.0, true),
                LodLevel::new(3, 200.0, false),
            ]),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnalignedLod { level: 3, step: 6, grid_size: 26 })
        );
    }

    #[test]
    fn test_rejects_bad_settings() {
        let falloff = TerrainSettings { falloff_strength: 2.0, ..Default::default() };
        assert_eq!(falloff.validate(), Err(ConfigError::InvalidFalloffStrength(2.0)));

        let scale = TerrainSettings { uniform_scale: 0.0, ..Default::default() };
        assert_eq!(scale.validate(), Err(ConfigError::InvalidUniformScale(0.0)));

        let workers = StreamingSettings { max_workers: 0, ..Default::default() };
        assert_eq!(workers.validate(), Err(ConfigError::InvalidWorkerCount));
    }

    #[test]
    fn test_json_rejects_invalid_noise() {
        let json = r#"{ "noise": { "scale": -1.0 } }"#;
        let err = TerrainConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, crate::core::Error::Config(ConfigError::InvalidScale(_))));
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let json = r#"{ "noise": { "seed": 7, "octaves": 3 } }"#;
        let config = TerrainConfig::from_json_str(json).unwrap();
        assert_eq!(config.noise.seed, 7);
        assert_eq!(config.noise.octaves, 3);
        assert_eq!(config.lods, LodTable::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs").join("terrain.json");

        let mut config = TerrainConfig::default();
        config.noise.seed = 99;
        config.terrain.use_falloff = true;
        config.save(&path).unwrap();

        let loaded = TerrainConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TerrainConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, crate::core::Error::Io(_)));
    }
}
