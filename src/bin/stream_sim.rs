//! Headless streaming simulation: walks an observer across the world and
//! logs chunk lifecycle events.
//!
//! Usage: cargo run --release --bin stream_sim -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Streaming config JSON (default: built-in defaults)
//!   --seed <SEED>     Override the noise seed
//!   --ticks <N>       Number of ticks to simulate (default: 600)
//!   --speed <UNITS>   Observer distance per tick (default: 4.0)
//!   --threads <N>     Use a pooled worker set of N threads
//!   --evict <SCANS>   Free chunks hidden for more than SCANS scans

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;

use terrastream::streaming::{
    ChunkCoord, ChunkListener, ChunkStreamingManager, StreamedChunk, StreamingConfig, TerrainChunk,
    WaterChunk, WorkerConfig,
};

/// Logs terrain events the way a prop-placement collaborator would see them
struct TerrainLog;

impl ChunkListener<TerrainChunk> for TerrainLog {
    fn chunk_loaded(&mut self, chunk: &TerrainChunk) {
        let grid = chunk.height_grid().map(|g| (g.min_value(), g.max_value()));
        log::info!(
            "Loaded {:?} (centre height {:?}, sample range {:?})",
            chunk.base().coord(),
            chunk.height_at(1, 1),
            grid
        );
    }

    fn chunk_visibility_changed(&mut self, chunk: &TerrainChunk, visible: bool) {
        log::info!("{:?} {}", chunk.base().coord(), if visible { "shown" } else { "hidden" });
    }

    fn chunk_evicted(&mut self, coord: ChunkCoord) {
        log::info!("Evicted {:?}", coord);
    }
}

struct WaterLog;

impl ChunkListener<WaterChunk> for WaterLog {
    fn chunk_loaded(&mut self, chunk: &WaterChunk) {
        log::debug!("Water ready at {:?}", chunk.base().coord());
    }
}

fn main() {
    terrastream::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => match StreamingConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => StreamingConfig::default(),
    };
    if let Some(seed) = parse_u32_arg(&args, "--seed") {
        config.height_map.noise.seed = seed;
    }
    if let Some(threads) = parse_usize_arg(&args, "--threads") {
        config.workers = WorkerConfig::Pooled { threads };
    }
    if let Some(scans) = parse_u32_arg(&args, "--evict") {
        config.evict_after_scans = Some(scans);
    }
    let ticks = parse_usize_arg(&args, "--ticks").unwrap_or(600);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(4.0);

    println!("=== Terrain Streaming Simulation ===");
    println!("Chunk size:    {}", config.chunk_world_size());
    println!("View distance: {}", config.max_view_distance);
    println!("Detail levels: {}", config.detail_levels.len());
    println!("Workers:       {:?}", config.workers);
    println!("Ticks:         {} at {} units/tick", ticks, speed);
    println!();

    let config = Arc::new(config);
    let observer = Rc::new(Cell::new(Vec2::ZERO));

    let position = Rc::clone(&observer);
    let mut terrain = match ChunkStreamingManager::terrain(Arc::clone(&config), move || position.get()) {
        Ok(manager) => manager,
        Err(e) => {
            log::error!("Invalid streaming config: {}", e);
            std::process::exit(1);
        }
    };
    terrain.add_listener(TerrainLog);

    let mut water = if config.water.is_some() {
        let position = Rc::clone(&observer);
        match ChunkStreamingManager::water(Arc::clone(&config), move || position.get()) {
            Ok(mut manager) => {
                manager.add_listener(WaterLog);
                Some(manager)
            }
            Err(e) => {
                log::error!("Failed to start water streaming: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let start = Instant::now();
    for tick in 0..ticks {
        // Straight walk with a slow sideways drift
        let t = tick as f32 * speed;
        observer.set(Vec2::new(t, (t / 400.0).sin() * 200.0));

        terrain.tick();
        if let Some(water) = water.as_mut() {
            water.tick();
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    println!();
    println!("=== Summary ===");
    println!("Elapsed:        {:.2}s", start.elapsed().as_secs_f32());
    println!("Observer at:    {:?}", terrain.viewer_position());
    println!("Chunks held:    {}", terrain.chunk_count());
    println!("Visible chunks: {}", terrain.visible_coords().len());
    println!("Pending tasks:  {}", terrain.pending_tasks());
    let meshed = terrain.chunks().filter(|(_, c)| c.active_mesh().is_some()).count();
    println!("Meshed chunks:  {}", meshed);
    if let Some(water) = water.as_ref() {
        println!("Water chunks:   {}", water.chunk_count());
    }
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
