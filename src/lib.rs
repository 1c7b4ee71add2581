//! Ridgeline - streamed procedural terrain
//!
//! Seeded fractal noise becomes chunk height grids, height grids become
//! LOD meshes with seam-correct normals, and a coordinator streams chunks
//! around a moving viewer on a bounded worker pool.

pub mod core;
pub mod math;
pub mod mesh;
pub mod streaming;
pub mod terrain;
