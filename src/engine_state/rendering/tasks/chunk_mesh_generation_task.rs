//! Task for generating mesh data for chunks in a background thread.
//!
//! A [`MeshJob`] owns a private copy of its chunk's block array and the four
//! boundary slices, so a worker never reads state the coordinating thread is
//! still mutating. The same job runs inline when no workers are available.

use std::sync::Arc;

use web_time::Instant;

use crate::engine_state::{
    rendering::meshing::{greedy_mesh, MeshBuffers, MeshContext},
    task_management::task::Task,
    voxels::{
        block::BlockId,
        chunk::{boundary::NeighborFaces, ChunkCoord},
    },
};

/// A request to mesh one chunk.
pub struct MeshJob {
    /// Matches the result back to the chunk's outstanding job.
    pub job_id: u64,
    pub coord: ChunkCoord,
    /// Copy of the chunk's blocks at dispatch time.
    pub blocks: Vec<BlockId>,
    pub neighbors: NeighborFaces,
    pub context: Arc<MeshContext>,
    /// When the scheduler handed the job out.
    pub submitted: Instant,
}

/// The output of a [`MeshJob`].
pub struct MeshResult {
    pub job_id: u64,
    pub coord: ChunkCoord,
    pub buffers: MeshBuffers,
    /// Time spent inside the mesher.
    pub timing_ms: f64,
    /// Time from submission until the mesh was built.
    pub latency_ms: f64,
}

impl Task for MeshJob {
    type Output = MeshResult;

    fn process(self) -> MeshResult {
        let started = Instant::now();
        let buffers = greedy_mesh(&self.context, self.coord, &self.blocks, &self.neighbors);
        let finished = Instant::now();

        MeshResult {
            job_id: self.job_id,
            coord: self.coord,
            buffers,
            timing_ms: finished.duration_since(started).as_secs_f64() * 1000.0,
            latency_ms: finished.duration_since(self.submitted).as_secs_f64() * 1000.0,
        }
    }
}
