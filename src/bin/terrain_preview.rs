//! Builds a single chunk at the origin and reports mesh statistics per LOD.
//!
//! Usage: cargo run --release --bin terrain_preview -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Load a JSON terrain config (default: built-in)
//!   --seed <SEED>     Override the noise seed
//!   --falloff         Apply the island falloff mask
//!   --flat            Use flat shading

use std::path::PathBuf;
use std::time::Instant;

use ridgeline::core::logging;
use ridgeline::core::Result;
use ridgeline::terrain::{TerrainConfig, TerrainGenerator};

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = match parse_arg::<PathBuf>(&args, "--config") {
        Some(path) => TerrainConfig::load(&path)?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = parse_arg::<u32>(&args, "--seed") {
        config.noise.seed = seed;
    }
    config.terrain.use_falloff |= args.iter().any(|a| a == "--falloff");
    config.terrain.flat_shading |= args.iter().any(|a| a == "--flat");

    let generator = TerrainGenerator::new(config)?;

    println!("=== Ridgeline Terrain Preview ===");
    println!("Seed:        {}", generator.config().noise.seed);
    println!("Grid:        {} x {}", generator.grid_size(), generator.grid_size());
    println!("Height span: {:.1} .. {:.1}", generator.min_height(), generator.max_height());
    println!();

    let start = Instant::now();
    let grid = generator.height_grid(glam::Vec2::ZERO);
    let (low, high) = grid.min_max();
    println!("Noise:       {:.2}ms, samples {:.3} .. {:.3}", start.elapsed().as_secs_f64() * 1000.0, low, high);
    println!();

    println!("{:>5} {:>6} {:>10} {:>10} {:>10}", "index", "level", "vertices", "triangles", "ms");
    for (index, lod) in generator.config().lods.levels().iter().enumerate() {
        let start = Instant::now();
        let mesh = generator.mesh(&grid, lod.level)?;
        println!(
            "{:>5} {:>6} {:>10} {:>10} {:>10.2}{}",
            index,
            lod.level,
            mesh.vertex_count(),
            mesh.triangle_count(),
            start.elapsed().as_secs_f64() * 1000.0,
            if lod.used_for_collision { "  (collision)" } else { "" }
        );
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}
