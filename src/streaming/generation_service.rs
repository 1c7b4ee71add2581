//! Background execution of height grid and mesh generation
//!
//! Jobs run on the blocking pool of a dedicated tokio runtime capped at
//! `max_workers` threads. Workers never touch chunk state: each finished job
//! is pushed with its correlation token into a [`ResultQueue`], and the owner
//! drains the queues from its own thread once per tick.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec2;
use tokio::runtime::{Builder, Runtime};

use super::result_queue::{Completed, ResultQueue};
use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::GeometryBuffer;
use crate::terrain::{HeightGrid, TerrainGenerator};

/// Output of a mesh job
pub type MeshResult = std::result::Result<Arc<GeometryBuffer>, Error>;

/// Continuation invoked with a finished height grid
pub type HeightCallback = Box<dyn FnOnce(Arc<HeightGrid>) + Send>;

/// Continuation invoked with a finished mesh
pub type MeshCallback = Box<dyn FnOnce(MeshResult) + Send>;

/// Decrements the in-flight counter when a job ends, including by panic.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Worker pool for terrain jobs.
///
/// `H` and `M` are the tokens carried by height and mesh requests and handed
/// back with their results.
pub struct GenerationService<H, M> {
    generator: Arc<TerrainGenerator>,
    runtime: Option<Runtime>,
    heights: ResultQueue<Completed<H, Arc<HeightGrid>>>,
    meshes: ResultQueue<Completed<M, MeshResult>>,
    in_flight: Arc<AtomicUsize>,
}

impl<H: Send + 'static, M: Send + 'static> GenerationService<H, M> {
    /// Start the worker pool sized from the generator's streaming settings
    pub fn new(generator: Arc<TerrainGenerator>) -> Result<Self> {
        let max_workers = generator.config().streaming.max_workers;
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_workers)
            .thread_name("terrain-worker")
            .build()?;

        log::info!("Generation service started with {} workers", max_workers);

        Ok(Self {
            generator,
            runtime: Some(runtime),
            heights: ResultQueue::new(),
            meshes: ResultQueue::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn generator(&self) -> &Arc<TerrainGenerator> {
        &self.generator
    }

    /// Queue generation of the height grid centered at `center` (chunk space)
    pub fn request_height_grid(&self, token: H, center: Vec2) {
        let generator = Arc::clone(&self.generator);
        let queue = self.heights.clone();
        self.spawn(move || {
            let grid = generator.height_grid(center);
            queue.push(Completed { token, value: Arc::new(grid) });
        });
    }

    /// Queue meshing of `grid` at a simplification level
    pub fn request_mesh(&self, token: M, grid: Arc<HeightGrid>, simplification_level: u32) {
        let generator = Arc::clone(&self.generator);
        let queue = self.meshes.clone();
        self.spawn(move || {
            let value = generator.mesh(&grid, simplification_level).map(Arc::new);
            queue.push(Completed { token, value });
        });
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        // Detached; the result travels through the queues
        runtime.spawn_blocking(move || {
            let _guard = guard;
            job();
        });
    }

    /// All height grids finished since the last drain, in completion order
    pub fn drain_height_results(&self) -> Vec<Completed<H, Arc<HeightGrid>>> {
        self.heights.drain().into()
    }

    /// All meshes finished since the last drain, in completion order
    pub fn drain_mesh_results(&self) -> Vec<Completed<M, MeshResult>> {
        self.meshes.drain().into()
    }

    /// Jobs submitted but not yet finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// No job running and no result waiting to be drained
    pub fn is_idle(&self) -> bool {
        // Jobs push before releasing the counter, so a zero count means every
        // result is already visible in the queues.
        self.in_flight() == 0 && self.heights.is_empty() && self.meshes.is_empty()
    }
}

impl GenerationService<HeightCallback, MeshCallback> {
    /// Drain both queues and run each result's callback on this thread.
    /// Returns the number of callbacks invoked.
    pub fn dispatch_callbacks(&self) -> usize {
        let mut dispatched = 0;
        for Completed { token, value } in self.drain_height_results() {
            token(value);
            dispatched += 1;
        }
        for Completed { token, value } in self.drain_mesh_results() {
            token(value);
            dispatched += 1;
        }
        dispatched
    }
}

impl<H, M> Drop for GenerationService<H, M> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            log::debug!("Shutting down generation service ({} jobs in flight)", self.in_flight.load(Ordering::Acquire));
            runtime.shutdown_background();
        }
    }
}
