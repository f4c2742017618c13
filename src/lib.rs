//! # Voxel World
//!
//! A chunked voxel world core: sparse block storage, deterministic terrain
//! generation, greedy meshing on background workers under a per-frame budget,
//! and a bounded liquid simulation.
//!
//! ## Key Modules
//!
//! * `core` - Configuration and the crate error type
//! * `engine_state` - Chunks, terrain, water, meshing, scheduling and the
//!   [`World`] façade
//!
//! ## Usage
//!
//! ```text
//! let mut world = World::new(EngineConfig::default(), Arc::new(DefaultBlockRegistry), Box::new(NullUploader::new()))?;
//! loop {
//!     world.ensure_chunks_around(player_x, player_z);
//!     world.advance();
//! }
//! ```
//!
//! The host supplies two collaborators: a [`BlockRegistry`] describing how
//! each block identifier renders, and a [`MeshUploader`] turning finished
//! buffers into GPU resources.

use std::path::Path;

use log::info;

pub mod core;
pub mod engine_state;

pub use crate::core::{EngineConfig, Error, Result, SchedulerConfig, WaterConfig, WorldConfig};
pub use engine_state::{
    rendering::{
        meshing::{greedy_mesh, MeshBuffers, MeshContext, MeshScheduler, SchedulerStats},
        GroupBuffers, MeshHandle, MeshUploader, NullUploader, Vertex,
    },
    voxels::{
        block::{
            block_side::BlockSide, block_type::BlockType, BlockId, BlockRegistry, DefaultBlockRegistry,
            RenderGroup, AIR, WATER,
        },
        chunk::{boundary::NeighborFaces, ChunkCoord, ChunkDimensions, MAX_WATER_LEVEL},
        chunk_store::SetBlockOptions,
        snapshot::{BlockSnapshot, RestoreReport, SnapshotEntry},
    },
    World, WorldStats,
};

/// Number of frames the headless driver runs.
const DEMO_TICKS: usize = 240;

/// Initializes `env_logger` writing to stdout, filtered by `RUST_LOG`.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
}

/// Runs the headless driver: builds a world from an optional JSON config,
/// walks the focus along the X axis and logs what the world did.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let chunk_width = config.world.chunk_width as f64;
    let mut world = World::new(
        config,
        std::sync::Arc::new(DefaultBlockRegistry),
        Box::new(NullUploader::new()),
    )?;

    let spawn = world.spawn_point();
    info!("Spawn point at {:?}", spawn);

    for tick in 0..DEMO_TICKS {
        let focus_x = spawn.x as f64 + tick as f64 * chunk_width / 32.0;
        world.ensure_chunks_around(focus_x, spawn.z as f64);
        world.advance();
    }
    world.settle(DEMO_TICKS);

    let stats = world.stats();
    info!(
        "Finished: {} chunks generated, {} loaded, {} non-air blocks, {} meshes applied, {} stale",
        stats.generated_chunks,
        stats.loaded_chunks,
        stats.non_air_blocks,
        stats.scheduler.results_applied,
        stats.scheduler.stale_results
    );
    Ok(())
}
