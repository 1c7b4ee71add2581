//! Streams terrain chunks around a moving viewer
//!
//! Each tick the coordinator applies finished generation results, then (on
//! the first tick or after the viewer moved far enough) recomputes the window
//! of chunks around the viewer. Chunks pick their LOD from the viewer's
//! distance to their bounds and request any mesh they are missing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec2;

use super::chunk::{ChunkCoord, MeshTicket, TerrainChunk};
use super::generation_service::GenerationService;
use crate::core::types::Result;
use crate::terrain::{TerrainConfig, TerrainGenerator};

/// What a single tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub heights_applied: usize,
    pub meshes_applied: usize,
    pub window_updated: bool,
}

/// Owns every chunk and the worker pool that fills them
pub struct ChunkCoordinator {
    generator: Arc<TerrainGenerator>,
    service: GenerationService<ChunkCoord, MeshTicket>,
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible: HashSet<ChunkCoord>,
    viewer: Vec2,
    last_window_viewer: Option<Vec2>,
    stride: f32,
    chunks_in_view: i32,
}

impl ChunkCoordinator {
    pub fn new(config: TerrainConfig) -> Result<Self> {
        Self::from_generator(Arc::new(TerrainGenerator::new(config)?))
    }

    pub fn from_generator(generator: Arc<TerrainGenerator>) -> Result<Self> {
        let service = GenerationService::new(Arc::clone(&generator))?;
        let stride = generator.chunk_stride();
        let chunks_in_view = (generator.config().lods.max_view_distance() / stride).round() as i32;

        log::info!(
            "Chunk coordinator: stride {}, view distance {}, {} chunks per side",
            stride,
            generator.config().lods.max_view_distance(),
            chunks_in_view * 2 + 1
        );

        Ok(Self {
            generator,
            service,
            chunks: HashMap::new(),
            visible: HashSet::new(),
            viewer: Vec2::ZERO,
            last_window_viewer: None,
            stride,
            chunks_in_view,
        })
    }

    /// Advance one frame with the viewer at `viewer_world` (world XZ)
    pub fn tick(&mut self, viewer_world: Vec2) -> TickReport {
        self.viewer = viewer_world / self.generator.config().terrain.uniform_scale;
        let mut report = TickReport::default();

        for result in self.service.drain_height_results() {
            if let Some(chunk) = self.chunks.get_mut(&result.token) {
                chunk.apply_height_grid(result.value);
                report.heights_applied += 1;
                self.update_chunk(result.token);
            }
        }

        for result in self.service.drain_mesh_results() {
            let ticket = result.token;
            if let Some(chunk) = self.chunks.get_mut(&ticket.coord) {
                chunk.apply_mesh(ticket.lod_index, result.value);
                report.meshes_applied += 1;
                self.update_chunk(ticket.coord);
            }
        }

        let threshold = self.generator.config().streaming.viewer_move_threshold;
        let moved = self
            .last_window_viewer
            .is_none_or(|last| last.distance_squared(self.viewer) > threshold * threshold);
        if moved {
            self.last_window_viewer = Some(self.viewer);
            self.update_visible_chunks();
            report.window_updated = true;
        }

        if report.heights_applied > 0 || report.meshes_applied > 0 {
            log::trace!(
                "Tick applied {} height grids and {} meshes, {} jobs in flight",
                report.heights_applied,
                report.meshes_applied,
                self.service.in_flight()
            );
        }
        report
    }

    /// Rebuild the visible window around the current viewer
    fn update_visible_chunks(&mut self) {
        for coord in self.visible.drain() {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.hide();
            }
        }

        let current = ChunkCoord::from_position(self.viewer, self.stride);
        let mut created = 0;
        for dy in -self.chunks_in_view..=self.chunks_in_view {
            for dx in -self.chunks_in_view..=self.chunks_in_view {
                let coord = ChunkCoord::new(current.x + dx, current.y + dy);
                if self.chunks.contains_key(&coord) {
                    self.update_chunk(coord);
                } else {
                    let chunk = TerrainChunk::new(coord, self.stride, &self.generator.config().lods);
                    self.service.request_height_grid(coord, chunk.center());
                    self.chunks.insert(coord, chunk);
                    created += 1;
                }
            }
        }

        log::debug!(
            "Visible window around {:?}: {} chunks created, {} visible, {} total",
            current,
            created,
            self.visible.len(),
            self.chunks.len()
        );
    }

    /// Re-evaluate one chunk against the current viewer and sync the visible set
    fn update_chunk(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if chunk.update(self.viewer, &self.generator.config().lods, &self.service) {
            self.visible.insert(coord);
        } else {
            self.visible.remove(&coord);
        }
    }

    pub fn generator(&self) -> &Arc<TerrainGenerator> {
        &self.generator
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks shown this frame
    pub fn visible_chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.visible.iter().filter_map(|coord| self.chunks.get(coord))
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Viewer position in chunk space as of the last tick
    pub fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    /// Generation jobs not yet finished
    pub fn pending_jobs(&self) -> usize {
        self.service.in_flight()
    }

    /// No generation in flight and no result waiting to be applied
    pub fn is_idle(&self) -> bool {
        self.service.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::chunk::MeshState;
    use crate::streaming::lod::{LodLevel, LodTable};
    use crate::terrain::TerrainSettings;
    use std::time::{Duration, Instant};

    const STRIDE: f32 = 22.0;

    fn config() -> TerrainConfig {
        let mut config = TerrainConfig {
            terrain: TerrainSettings { chunk_size: Some(23), ..Default::default() },
            lods: LodTable::new(vec![
                LodLevel::new(0, 30.0, true),
                LodLevel::new(1, 45.0, false),
                LodLevel::new(2, 60.0, false),
            ]),
            ..Default::default()
        };
        config.streaming.max_workers = 4;
        config
    }

    fn run_until_idle(coordinator: &mut ChunkCoordinator, viewer: Vec2) {
        let deadline = Instant::now() + Duration::from_secs(60);
        loop {
            coordinator.tick(viewer);
            if coordinator.is_idle() {
                return;
            }
            assert!(Instant::now() < deadline, "streaming did not converge");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_first_tick_creates_window() {
        let mut coordinator = ChunkCoordinator::new(config()).unwrap();
        let report = coordinator.tick(Vec2::ZERO);

        // round(60 / 22) = 3 chunks each side
        assert!(report.window_updated);
        assert_eq!(coordinator.chunk_count(), 49);
        assert_eq!(coordinator.visible_count(), 0);
        assert!(coordinator.chunk(ChunkCoord::new(3, -3)).is_some());
        assert!(coordinator.chunk(ChunkCoord::new(4, 0)).is_none());
    }

    #[test]
    fn test_streaming_converges() {
        let mut coordinator = ChunkCoordinator::new(config()).unwrap();
        run_until_idle(&mut coordinator, Vec2::ZERO);

        let lods = coordinator.generator().config().lods.clone();
        for chunk in coordinator.chunks() {
            assert!(chunk.height_grid().is_some());

            let distance = chunk.bounds().sq_distance(Vec2::ZERO).sqrt();
            if distance <= lods.max_view_distance() {
                assert!(chunk.is_visible());
                assert_eq!(chunk.displayed_lod(), Some(lods.select(distance)));
                assert!(chunk.displayed_mesh().is_some_and(|mesh| mesh.is_well_formed()));
            } else {
                assert!(!chunk.is_visible());
                assert!(chunk.displayed_mesh().is_none());
            }
        }

        let origin = coordinator.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(origin.displayed_lod(), Some(0));
        assert!(origin.collision_mesh().is_some());
        assert_eq!(
            coordinator.visible_count(),
            coordinator.chunks().filter(|c| c.is_visible()).count()
        );
    }

    #[test]
    fn test_move_threshold() {
        let mut coordinator = ChunkCoordinator::new(config()).unwrap();
        assert!(coordinator.tick(Vec2::ZERO).window_updated);
        assert!(!coordinator.tick(Vec2::new(10.0, 0.0)).window_updated);
        assert!(!coordinator.tick(Vec2::new(20.0, 15.0)).window_updated);
        assert!(coordinator.tick(Vec2::new(30.0, 0.0)).window_updated);
    }

    #[test]
    fn test_uniform_scale_divides_viewer() {
        let mut config = config();
        config.terrain.uniform_scale = 2.0;
        let mut coordinator = ChunkCoordinator::new(config).unwrap();

        coordinator.tick(Vec2::new(88.0, -44.0));
        assert_eq!(coordinator.viewer_position(), Vec2::new(44.0, -22.0));
        // Window is centered on chunk (2, -1)
        assert!(coordinator.chunk(ChunkCoord::new(5, -4)).is_some());
        assert!(coordinator.chunk(ChunkCoord::new(-2, 0)).is_none());
    }

    #[test]
    fn test_hidden_chunks_retained() {
        let mut coordinator = ChunkCoordinator::new(config()).unwrap();
        run_until_idle(&mut coordinator, Vec2::ZERO);
        let initial = coordinator.chunk_count();

        let far = Vec2::new(STRIDE * 20.0, 0.0);
        run_until_idle(&mut coordinator, far);

        let origin = coordinator.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert!(!origin.is_visible());
        assert!(origin.height_grid().is_some());
        assert!(origin.displayed_mesh().is_some());
        assert_eq!(coordinator.chunk_count(), initial * 2);

        // Returning shows cached chunks without generating new ones
        let report = coordinator.tick(Vec2::ZERO);
        assert!(report.window_updated);
        assert_eq!(coordinator.chunk_count(), initial * 2);
        assert!(coordinator.chunk(ChunkCoord::new(0, 0)).unwrap().is_visible());
        assert_eq!(coordinator.pending_jobs(), 0);
    }

    #[test]
    fn test_late_mesh_cached_on_hidden_chunk() {
        // Large enough grids that a mesh job cannot finish inside the tick that queued it
        let mut config = config();
        config.terrain.chunk_size = Some(119);
        config.lods = LodTable::new(vec![
            LodLevel::new(0, 160.0, true),
            LodLevel::new(1, 240.0, false),
            LodLevel::new(2, 320.0, false),
        ]);
        let mut coordinator = ChunkCoordinator::new(config).unwrap();
        let origin = ChunkCoord::new(0, 0);

        let deadline = Instant::now() + Duration::from_secs(60);
        while coordinator.chunk(origin).is_none_or(|c| c.height_grid().is_none()) {
            coordinator.tick(Vec2::ZERO);
            assert!(Instant::now() < deadline, "height grid never arrived");
            std::thread::sleep(Duration::from_millis(1));
        }
        let chunk = coordinator.chunk(origin).unwrap();
        assert!(matches!(chunk.lod_meshes()[0].state, MeshState::Requested));

        // Leave before the mesh lands
        run_until_idle(&mut coordinator, Vec2::new(118.0 * 20.0, 0.0));
        let chunk = coordinator.chunk(origin).unwrap();
        assert!(!chunk.is_visible());
        assert!(matches!(chunk.lod_meshes()[0].state, MeshState::Ready(_)));
        assert_eq!(chunk.displayed_lod(), None);
        assert!(chunk.collision_mesh().is_none());

        coordinator.tick(Vec2::ZERO);
        let chunk = coordinator.chunk(origin).unwrap();
        assert!(chunk.is_visible());
        assert_eq!(chunk.displayed_lod(), Some(0));
        assert!(chunk.collision_mesh().is_some());
    }

    #[test]
    fn test_cached_lod_swapped_without_request() {
        let mut coordinator = ChunkCoordinator::new(config()).unwrap();
        let east = ChunkCoord::new(1, 0);

        // Bounds span x in [11, 33]: distance 11 from the origin, 41 from x = -30
        run_until_idle(&mut coordinator, Vec2::ZERO);
        assert_eq!(coordinator.chunk(east).unwrap().displayed_lod(), Some(0));

        run_until_idle(&mut coordinator, Vec2::new(-30.0, 0.0));
        let chunk = coordinator.chunk(east).unwrap();
        assert_eq!(chunk.displayed_lod(), Some(1));
        assert!(matches!(chunk.lod_meshes()[0].state, MeshState::Ready(_)));

        let report = coordinator.tick(Vec2::ZERO);
        assert!(report.window_updated);
        assert_eq!(report.meshes_applied, 0);
        assert_eq!(coordinator.chunk(east).unwrap().displayed_lod(), Some(0));
        assert_eq!(coordinator.pending_jobs(), 0);
    }
}
