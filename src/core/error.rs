//! Error types for terrain generation and streaming

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The height grid cannot be triangulated at the requested simplification step.
    #[error("height grid of side {size} is not aligned to simplification step {step}")]
    UnalignedGrid { size: usize, step: usize },
}

/// Malformed configuration, rejected before any generation is scheduled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("noise scale must be positive and finite, got {0}")]
    InvalidScale(f32),

    #[error("noise needs at least one octave")]
    ZeroOctaves,

    #[error("lacunarity must be >= 1, got {0}")]
    InvalidLacunarity(f32),

    #[error("persistence must be in [0, 1], got {0}")]
    InvalidPersistence(f32),

    #[error("falloff strength must be in [0, 1], got {0}")]
    InvalidFalloffStrength(f32),

    #[error("uniform scale must be positive and finite, got {0}")]
    InvalidUniformScale(f32),

    #[error("chunk size must be at least 2, got {0}")]
    InvalidChunkSize(usize),

    #[error("LOD table is empty")]
    EmptyLodTable,

    #[error("LOD thresholds must be strictly ascending (index {index}: {threshold} after {previous})")]
    NonMonotonicLod { index: usize, previous: f32, threshold: f32 },

    #[error("exactly one LOD level must back collision, found {0}")]
    CollisionLod(usize),

    #[error("simplification level {level} exceeds maximum {max}")]
    InvalidSimplification { level: u32, max: u32 },

    #[error("chunk grid of side {grid_size} cannot be simplified with step {step} (LOD level {level})")]
    UnalignedLod { level: u32, step: usize, grid_size: usize },

    #[error("height curve keyframes must have ascending times and non-decreasing values")]
    NonMonotonicCurve,

    #[error("worker pool needs at least one worker")]
    InvalidWorkerCount,

    #[error("viewer move threshold must be non-negative and finite, got {0}")]
    InvalidMoveThreshold(f32),
}
