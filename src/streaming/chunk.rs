//! Terrain chunk state

use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::generation_service::{GenerationService, MeshResult};
use super::lod::LodTable;
use crate::math::Bounds2;
use crate::mesh::GeometryBuffer;
use crate::terrain::HeightGrid;

/// Integer chunk position on the XZ plane
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk whose center is nearest to `position` (chunk space)
    pub fn from_position(position: Vec2, stride: f32) -> Self {
        Self {
            x: (position.x / stride).round() as i32,
            y: (position.y / stride).round() as i32,
        }
    }

    /// Center of this chunk in chunk space
    pub fn center(&self, stride: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * stride
    }
}

/// Correlation token for a mesh job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshTicket {
    pub coord: ChunkCoord,
    pub lod_index: usize,
}

/// Generation state of one LOD slot
#[derive(Clone, Debug, Default)]
pub enum MeshState {
    #[default]
    Unrequested,
    Requested,
    Ready(Arc<GeometryBuffer>),
    Failed,
}

/// Mesh cache for one entry of the LOD table
#[derive(Clone, Debug)]
pub struct LodMesh {
    pub level: u32,
    pub state: MeshState,
}

impl LodMesh {
    pub fn new(level: u32) -> Self {
        Self { level, state: MeshState::Unrequested }
    }

    pub fn mesh(&self) -> Option<&Arc<GeometryBuffer>> {
        match &self.state {
            MeshState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// One tile of terrain and everything generated for it so far.
///
/// Nothing is shown until the height grid has arrived. Hidden chunks keep
/// their grid and meshes so revisiting them costs no regeneration.
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    center: Vec2,
    bounds: Bounds2,
    height_grid: Option<Arc<HeightGrid>>,
    lod_meshes: Vec<LodMesh>,
    displayed_lod: Option<usize>,
    collision_mesh: Option<Arc<GeometryBuffer>>,
    visible: bool,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, stride: f32, lods: &LodTable) -> Self {
        let center = coord.center(stride);
        Self {
            coord,
            center,
            bounds: Bounds2::from_center_size(center, Vec2::splat(stride)),
            height_grid: None,
            lod_meshes: lods.levels().iter().map(|lod| LodMesh::new(lod.level)).collect(),
            displayed_lod: None,
            collision_mesh: None,
            visible: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Center in chunk space
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Placement of the chunk's mesh in the world
    pub fn world_position(&self, uniform_scale: f32) -> Vec3 {
        Vec3::new(self.center.x, 0.0, self.center.y) * uniform_scale
    }

    pub fn bounds(&self) -> &Bounds2 {
        &self.bounds
    }

    pub fn height_grid(&self) -> Option<&Arc<HeightGrid>> {
        self.height_grid.as_ref()
    }

    pub fn lod_meshes(&self) -> &[LodMesh] {
        &self.lod_meshes
    }

    pub fn displayed_lod(&self) -> Option<usize> {
        self.displayed_lod
    }

    /// Geometry currently shown for this chunk
    pub fn displayed_mesh(&self) -> Option<&Arc<GeometryBuffer>> {
        self.displayed_lod
            .and_then(|index| self.lod_meshes.get(index))
            .and_then(LodMesh::mesh)
    }

    pub fn collision_mesh(&self) -> Option<&Arc<GeometryBuffer>> {
        self.collision_mesh.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn hide(&mut self) {
        self.visible = false;
    }

    pub(crate) fn apply_height_grid(&mut self, grid: Arc<HeightGrid>) {
        self.height_grid = Some(grid);
    }

    pub(crate) fn apply_mesh(&mut self, lod_index: usize, result: MeshResult) {
        let Some(slot) = self.lod_meshes.get_mut(lod_index) else {
            return;
        };
        slot.state = match result {
            Ok(mesh) => MeshState::Ready(mesh),
            Err(err) => {
                log::warn!("Mesh for chunk {:?} at LOD {} failed: {}", self.coord, slot.level, err);
                MeshState::Failed
            }
        };
    }

    /// Re-evaluate visibility, displayed LOD and collision for a viewer at
    /// `viewer` (chunk space), requesting missing meshes. Returns visibility.
    pub(crate) fn update(
        &mut self,
        viewer: Vec2,
        lods: &LodTable,
        service: &GenerationService<ChunkCoord, MeshTicket>,
    ) -> bool {
        let Some(grid) = self.height_grid.clone() else {
            return false;
        };

        let distance = self.bounds.sq_distance(viewer).sqrt();
        self.visible = distance <= lods.max_view_distance();
        if !self.visible {
            return false;
        }

        let lod_index = lods.select(distance);
        if self.displayed_lod != Some(lod_index) {
            match self.lod_meshes[lod_index].state {
                MeshState::Ready(_) => self.displayed_lod = Some(lod_index),
                MeshState::Unrequested => self.request_mesh(lod_index, &grid, service),
                MeshState::Requested | MeshState::Failed => {}
            }
        }

        if lod_index == 0 && self.collision_mesh.is_none() {
            if let Some(collision_index) = lods.collision_index() {
                match &self.lod_meshes[collision_index].state {
                    MeshState::Ready(mesh) => self.collision_mesh = Some(Arc::clone(mesh)),
                    MeshState::Unrequested => self.request_mesh(collision_index, &grid, service),
                    MeshState::Requested | MeshState::Failed => {}
                }
            }
        }

        true
    }

    fn request_mesh(
        &mut self,
        lod_index: usize,
        grid: &Arc<HeightGrid>,
        service: &GenerationService<ChunkCoord, MeshTicket>,
    ) {
        let slot = &mut self.lod_meshes[lod_index];
        slot.state = MeshState::Requested;
        service.request_mesh(
            MeshTicket { coord: self.coord, lod_index },
            Arc::clone(grid),
            slot.level,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::lod::LodLevel;

    fn lods() -> LodTable {
        LodTable::new(vec![
            LodLevel::new(0, 30.0, true),
            LodLevel::new(2, 60.0, false),
        ])
    }

    #[test]
    fn test_coord_from_position_rounds() {
        assert_eq!(ChunkCoord::from_position(Vec2::new(10.0, -10.0), 22.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_position(Vec2::new(12.0, -12.0), 22.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::new(2, -3).center(22.0), Vec2::new(44.0, -66.0));
    }

    #[test]
    fn test_new_chunk_layout() {
        let chunk = TerrainChunk::new(ChunkCoord::new(1, 0), 22.0, &lods());
        assert_eq!(chunk.center(), Vec2::new(22.0, 0.0));
        assert_eq!(chunk.world_position(2.0), Vec3::new(44.0, 0.0, 0.0));
        assert_eq!(chunk.bounds().min, Vec2::new(11.0, -11.0));
        assert_eq!(chunk.lod_meshes().len(), 2);
        assert_eq!(chunk.lod_meshes()[1].level, 2);
        assert!(!chunk.is_visible());
        assert!(chunk.displayed_mesh().is_none());
    }

    #[test]
    fn test_apply_mesh_states() {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 22.0, &lods());
        chunk.apply_mesh(0, Ok(Arc::new(GeometryBuffer::default())));
        chunk.apply_mesh(1, Err(crate::core::Error::UnalignedGrid { size: 4, step: 2 }));
        // Out-of-range slots are ignored
        chunk.apply_mesh(5, Ok(Arc::new(GeometryBuffer::default())));

        assert!(chunk.lod_meshes()[0].mesh().is_some());
        assert!(matches!(chunk.lod_meshes()[1].state, MeshState::Failed));
    }
}
