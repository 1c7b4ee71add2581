//! Terrain mesh construction

pub mod builder;
pub mod geometry;

pub use builder::{MeshBuilder, MAX_SIMPLIFICATION_LEVEL, simplification_step};
pub use geometry::{GeometryBuffer, Shading};
