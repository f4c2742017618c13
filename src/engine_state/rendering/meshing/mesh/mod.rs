//! Mesh generation for chunk rendering.
//!
//! This module converts a chunk's block array into GPU-friendly vertex and index
//! buffers. It implements greedy meshing to reduce the number of quads by
//! combining coplanar faces that share a block, tile and render group.
//!
//! # Architecture
//! - [`MeshBuffers`]: one [`GroupBuffers`] per render group
//! - [`MaskCell`] / [`Quad`]: a visible unit face and a merged rectangle
//! - [`greedy_mesh`]: the meshing entry point, shared by workers and the
//!   synchronous fallback

mod face;
mod greedy;
mod mesh;

pub use face::{MaskCell, Quad};
pub use greedy::greedy_mesh;
pub use mesh::*;
