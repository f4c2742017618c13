//! Mesh generation and scheduling for chunk rendering.
//!
//! # Architecture
//! - `mesh/`: the greedy mesher and its output buffers
//! - [`MeshScheduler`]: generation, mesh dispatch and mesh apply queues, each
//!   drained under a per-tick budget
//! - [`MeshContext`]: the immutable state every mesh job shares

use std::sync::Arc;

use crate::engine_state::voxels::{block::BlockRegistry, chunk::ChunkDimensions};

mod mesh;
pub mod scheduler;

pub use mesh::*;
pub use scheduler::{MeshScheduler, SchedulerStats};

/// Shared, immutable inputs of every mesh job.
///
/// Sent to the workers once as an `Arc`; jobs carry only their chunk data.
pub struct MeshContext {
    pub dims: ChunkDimensions,
    pub registry: Arc<dyn BlockRegistry>,
}

impl MeshContext {
    pub fn new(dims: ChunkDimensions, registry: Arc<dyn BlockRegistry>) -> Arc<Self> {
        Arc::new(MeshContext { dims, registry })
    }
}
