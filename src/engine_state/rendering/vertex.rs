//! Vertex data structures for chunk meshes.
//!
//! This module defines the vertex format produced by the greedy mesher. The
//! layout is plain old data so a renderer can upload a buffer with
//! `bytemuck::cast_slice` and no per-vertex conversion.

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes), chunk-local
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes), in tile units
/// - Tile Index: u32 (4 bytes)
///
/// Total size: 36 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position relative to the chunk origin
    pub position: [f32; 3],
    /// Unit face normal
    pub normal: [f32; 3],
    /// Texture coordinates; a repeating texture tiles once per unit
    pub uv: [f32; 2],
    /// Index of the atlas tile
    pub tile: u32,
}

impl Vertex {
    /// Byte offsets of each attribute, in declaration order.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: normal (vec3<f32>)
    /// - `location = 2`: uv (vec2<f32>)
    /// - `location = 3`: tile (u32)
    pub const ATTRIBUTE_OFFSETS: [usize; 4] = [0, 12, 24, 32];

    /// Distance in bytes between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], tile: u32) -> Self {
        Vertex {
            position,
            normal,
            uv,
            tile,
        }
    }
}
