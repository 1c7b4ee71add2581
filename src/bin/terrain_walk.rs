//! Streams terrain around a viewer walking in a straight line.
//!
//! Usage: cargo run --release --bin terrain_walk -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Load a JSON terrain config (default: built-in)
//!   --save-config <PATH>  Write the effective config as JSON and continue
//!   --seed <SEED>         Override the noise seed
//!   --ticks <N>           Number of frames to simulate (default: 600)
//!   --speed <UNITS>       World units travelled per frame (default: 4.0)
//!   --heading <DEGREES>   Walking direction on the XZ plane (default: 0)
//!   --flat                Use flat shading

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::Vec2;

use ridgeline::core::logging;
use ridgeline::core::Result;
use ridgeline::streaming::ChunkCoordinator;
use ridgeline::terrain::TerrainConfig;

const FRAME_TIME: Duration = Duration::from_millis(16);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let ticks = parse_arg::<usize>(&args, "--ticks").unwrap_or(600);
    let speed = parse_arg::<f32>(&args, "--speed").unwrap_or(4.0);
    let heading = parse_arg::<f32>(&args, "--heading").unwrap_or(0.0).to_radians();

    let mut config = match parse_arg::<PathBuf>(&args, "--config") {
        Some(path) => TerrainConfig::load(&path)?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = parse_arg::<u32>(&args, "--seed") {
        config.noise.seed = seed;
    }
    if args.iter().any(|a| a == "--flat") {
        config.terrain.flat_shading = true;
    }
    if let Some(path) = parse_arg::<PathBuf>(&args, "--save-config") {
        config.save(&path)?;
        log::info!("Saved config to {}", path.display());
    }

    println!("=== Ridgeline Terrain Walk ===");
    println!("Seed:     {}", config.noise.seed);
    println!("Chunk:    {} ({} shading)", config.terrain.chunk_size(), if config.terrain.flat_shading { "flat" } else { "smooth" });
    println!("View:     {}", config.lods.max_view_distance());
    println!("Workers:  {}", config.streaming.max_workers);
    println!("Walk:     {} frames at {} units/frame", ticks, speed);
    println!();

    let mut coordinator = ChunkCoordinator::new(config)?;
    let direction = Vec2::new(heading.cos(), heading.sin());
    let start = Instant::now();
    let mut totals = (0usize, 0usize, 0usize);

    for frame in 0..ticks {
        let viewer = direction * speed * frame as f32;
        let report = coordinator.tick(viewer);
        totals.0 += report.heights_applied;
        totals.1 += report.meshes_applied;
        totals.2 += usize::from(report.window_updated);

        if frame % 60 == 0 {
            log::info!(
                "Frame {:4}: viewer ({:.0}, {:.0}), {} chunks, {} visible, {} jobs pending",
                frame,
                viewer.x,
                viewer.y,
                coordinator.chunk_count(),
                coordinator.visible_count(),
                coordinator.pending_jobs()
            );
        }
        std::thread::sleep(FRAME_TIME);
    }

    // Let outstanding work land at the final position
    let final_viewer = direction * speed * ticks.saturating_sub(1) as f32;
    let settle_start = Instant::now();
    while !coordinator.is_idle() && settle_start.elapsed() < SETTLE_TIMEOUT {
        let report = coordinator.tick(final_viewer);
        totals.0 += report.heights_applied;
        totals.1 += report.meshes_applied;
        std::thread::sleep(FRAME_TIME);
    }
    if !coordinator.is_idle() {
        log::warn!("{} jobs still pending after settle timeout", coordinator.pending_jobs());
    }

    let vertices: usize = coordinator
        .visible_chunks()
        .filter_map(|chunk| chunk.displayed_mesh())
        .map(|mesh| mesh.vertex_count())
        .sum();

    println!();
    println!("=== Summary ===");
    println!("Elapsed:         {:.2}s", start.elapsed().as_secs_f64());
    println!("Chunks created:  {}", coordinator.chunk_count());
    println!("Visible chunks:  {}", coordinator.visible_count());
    println!("Height grids:    {}", totals.0);
    println!("Meshes:          {}", totals.1);
    println!("Window updates:  {}", totals.2);
    println!("Visible verts:   {}", vertices);

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}
