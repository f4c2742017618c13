//! Mesh data structures for chunk rendering.
//!
//! The mesher writes each quad into the buffer set of its render group. Groups
//! are drawn with different pipelines, so they stay independent all the way to
//! the uploader.

use crate::engine_state::{rendering::Vertex, voxels::block::RenderGroup};

/// Vertex and index data of one render group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl GroupBuffers {
    /// An empty buffer set means the group's mesh should be dropped, not uploaded.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of quads held.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Appends one quad.
    ///
    /// # Arguments
    /// * `corners` - The four vertices in counter-clockwise order seen from the
    ///   positive side of the face axis
    /// * `positive` - Whether the face points towards positive coordinates;
    ///   negative faces get the opposite winding
    pub fn push_quad(&mut self, corners: [Vertex; 4], positive: bool) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        let order: [u32; 6] = if positive {
            [0, 1, 2, 0, 2, 3]
        } else {
            [0, 2, 1, 0, 3, 2]
        };
        self.indices.extend(order.iter().map(|offset| base + offset));
    }
}

/// The complete mesh of a chunk: one buffer set per render group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Indexed by [`RenderGroup::index`].
    pub groups: [GroupBuffers; 3],
}

impl MeshBuffers {
    pub fn new() -> Self {
        MeshBuffers::default()
    }

    pub fn group(&self, group: RenderGroup) -> &GroupBuffers {
        &self.groups[group.index()]
    }

    pub fn group_mut(&mut self, group: RenderGroup) -> &mut GroupBuffers {
        &mut self.groups[group.index()]
    }

    /// Total quads across all groups.
    pub fn quad_count(&self) -> usize {
        self.groups.iter().map(GroupBuffers::quad_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(GroupBuffers::is_empty)
    }
}
