//! # Engine Configuration
//!
//! Static world constants and per-tick budgets. Every field has a default, so a
//! partial JSON document only needs to name the values it changes:
//!
//! ```json
//! { "world": { "seed": 1337, "view_radius": 6 }, "scheduler": { "worker_count": 2 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Top-level configuration for a [`World`](crate::World).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub scheduler: SchedulerConfig,
    pub water: WaterConfig,
}

/// Dimensions and generation parameters of the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk extent along X, in blocks.
    pub chunk_width: usize,
    /// Chunk extent along Z, in blocks.
    pub chunk_depth: usize,
    /// World height in blocks; valid `y` is `0..height`.
    pub height: usize,
    pub seed: u32,
    /// Highest `y` filled with water by terrain generation.
    pub sea_level: i32,
    /// Streaming radius in chunks (square, Chebyshev distance).
    pub view_radius: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            chunk_width: 16,
            chunk_depth: 16,
            height: 64,
            seed: 1337,
            sea_level: 24,
            view_radius: 4,
        }
    }
}

/// Per-tick budgets for the generation and mesh queues.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub generation_budget_ms: f64,
    pub mesh_dispatch_budget_ms: f64,
    pub mesh_apply_budget_ms: f64,
    /// Hard cap on mesh jobs dispatched in a single tick.
    pub max_dispatch_per_tick: usize,
    /// Number of background mesh workers. Zero meshes on the calling thread.
    pub worker_count: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            generation_budget_ms: 4.0,
            mesh_dispatch_budget_ms: 3.0,
            mesh_apply_budget_ms: 2.0,
            max_dispatch_per_tick: 8,
            worker_count: 2,
        }
    }
}

/// Per-tick budget for the water relaxation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub max_cells_per_tick: usize,
    pub budget_ms: f64,
}

impl Default for WaterConfig {
    fn default() -> Self {
        WaterConfig {
            max_cells_per_tick: 512,
            budget_ms: 2.0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the invariants the rest of the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.chunk_width == 0 || world.chunk_depth == 0 || world.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "chunk dimensions must be non-zero, got {}x{}x{}",
                world.chunk_width, world.height, world.chunk_depth
            )));
        }
        if world.sea_level < 0 || world.sea_level >= world.height as i32 {
            return Err(Error::InvalidConfig(format!(
                "sea level {} outside world height {}",
                world.sea_level, world.height
            )));
        }
        if world.view_radius < 0 {
            return Err(Error::InvalidConfig(format!(
                "view radius must not be negative, got {}",
                world.view_radius
            )));
        }
        Ok(())
    }
}
