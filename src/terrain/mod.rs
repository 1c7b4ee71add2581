//! Procedural terrain generation

pub mod config;
pub mod curve;
pub mod falloff;
pub mod generator;
pub mod height_grid;
pub mod noise_field;

pub use config::{StreamingSettings, TerrainConfig, TerrainSettings};
pub use curve::{HeightCurve, Keyframe, KeyframeCurve};
pub use falloff::FalloffMask;
pub use generator::TerrainGenerator;
pub use height_grid::HeightGrid;
pub use noise_field::{NoiseConfig, NoiseField, NormalizeMode};
