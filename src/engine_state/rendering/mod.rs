//! Rendering system for the voxel engine.
//!
//! The core produces mesh buffers; it never touches a graphics API. Finished
//! buffers cross to the renderer through the [`MeshUploader`] seam, which hands
//! back an opaque [`MeshHandle`] the owning chunk keeps until the mesh is
//! replaced or the chunk is unloaded.

use std::collections::HashSet;

use crate::engine_state::voxels::{block::RenderGroup, chunk::ChunkCoord};

pub mod meshing;
pub mod tasks;
mod vertex;

pub use meshing::GroupBuffers;
pub use vertex::Vertex;

/// Opaque reference to GPU resources created by a [`MeshUploader`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// The renderer collaborator.
///
/// Called only from the coordinating thread, once per non-empty render group
/// of every applied mesh.
pub trait MeshUploader {
    /// Creates GPU resources for one group of a chunk mesh.
    fn upload(&mut self, coord: ChunkCoord, group: RenderGroup, buffers: &GroupBuffers) -> MeshHandle;

    /// Releases resources previously returned by [`upload`](Self::upload).
    fn dispose(&mut self, handle: MeshHandle);
}

/// A headless uploader that only hands out handles and tracks the live ones.
#[derive(Debug, Default)]
pub struct NullUploader {
    next_handle: u64,
    live: HashSet<MeshHandle>,
}

impl NullUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles uploaded and not yet disposed.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }
}

impl MeshUploader for NullUploader {
    fn upload(&mut self, _coord: ChunkCoord, _group: RenderGroup, _buffers: &GroupBuffers) -> MeshHandle {
        self.next_handle += 1;
        let handle = MeshHandle(self.next_handle);
        self.live.insert(handle);
        handle
    }

    fn dispose(&mut self, handle: MeshHandle) {
        if !self.live.remove(&handle) {
            log::warn!("Disposed unknown mesh handle {handle:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_uploader_tracks_live_handles() {
        let mut uploader = NullUploader::new();
        let buffers = GroupBuffers::default();
        let a = uploader.upload(ChunkCoord::new(0, 0), RenderGroup::Opaque, &buffers);
        let b = uploader.upload(ChunkCoord::new(0, 0), RenderGroup::Water, &buffers);
        assert_ne!(a, b);
        assert_eq!(uploader.live_handles(), 2);
        uploader.dispose(a);
        assert_eq!(uploader.live_handles(), 1);
    }
}
