//! Chunk streaming around a moving viewer

pub mod chunk;
pub mod coordinator;
pub mod generation_service;
pub mod lod;
pub mod result_queue;

pub use chunk::{ChunkCoord, LodMesh, MeshState, MeshTicket, TerrainChunk};
pub use coordinator::{ChunkCoordinator, TickReport};
pub use generation_service::{GenerationService, HeightCallback, MeshCallback, MeshResult};
pub use lod::{LodLevel, LodTable};
pub use result_queue::{Completed, ResultQueue};
