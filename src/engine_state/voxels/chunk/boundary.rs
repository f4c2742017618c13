//! # Chunk Boundary Module
//!
//! One-cell-thick boundary slices exchanged between neighbouring chunks at mesh
//! time. A chunk's faces depend on the blocks just across its borders; rather
//! than sharing references to neighbours, the scheduler copies these slices into
//! each mesh job so the job owns everything it reads.

use super::{Chunk, ChunkDimensions};
use crate::engine_state::voxels::block::{BlockId, AIR};

/// Boundary blocks of the four horizontal neighbours of a chunk.
///
/// X-facing slices are indexed `y * depth + z`; Z-facing slices are indexed
/// `y * width + x`. A missing or ungenerated neighbour is an all-air slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborFaces {
    /// Cells at `x = width - 1` of the chunk at -X.
    pub neg_x: Vec<BlockId>,
    /// Cells at `x = 0` of the chunk at +X.
    pub pos_x: Vec<BlockId>,
    /// Cells at `z = depth - 1` of the chunk at -Z.
    pub neg_z: Vec<BlockId>,
    /// Cells at `z = 0` of the chunk at +Z.
    pub pos_z: Vec<BlockId>,
}

impl NeighborFaces {
    /// Boundary slices for a chunk with no generated neighbours.
    pub fn empty(dims: ChunkDimensions) -> Self {
        let x_len = dims.height * dims.depth;
        let z_len = dims.height * dims.width;
        NeighborFaces {
            neg_x: vec![AIR; x_len],
            pos_x: vec![AIR; x_len],
            neg_z: vec![AIR; z_len],
            pos_z: vec![AIR; z_len],
        }
    }
}

impl Chunk {
    /// Copies the YZ plane at chunk-local `x`.
    pub fn x_face(&self, dims: ChunkDimensions, x: usize) -> Vec<BlockId> {
        let mut face = Vec::with_capacity(dims.height * dims.depth);
        for y in 0..dims.height {
            for z in 0..dims.depth {
                face.push(self.blocks[dims.index(x, y, z)]);
            }
        }
        face
    }

    /// Copies the XY plane at chunk-local `z`.
    pub fn z_face(&self, dims: ChunkDimensions, z: usize) -> Vec<BlockId> {
        let mut face = Vec::with_capacity(dims.height * dims.width);
        for y in 0..dims.height {
            for x in 0..dims.width {
                face.push(self.blocks[dims.index(x, y, z)]);
            }
        }
        face
    }
}
