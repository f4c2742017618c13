//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one full-height column of the world,
//! `width × height × depth` blocks, stored as two dense arrays.
//!
//! ## Storage
//!
//! - `blocks`: one `u16` identifier per cell, `0` is air
//! - `water`: one byte per cell, `0` when the cell is not water; otherwise the
//!   level plus one, with [`WATER_SOURCE_FLAG`] set for self-sustaining sources
//!
//! Cells are laid out X-fastest, then Z, then Y, so a horizontal layer is one
//! contiguous run of `width × depth` entries.
//!
//! ## Lifecycle Flags
//!
//! A chunk is created empty on first access, generated exactly once, remeshed
//! whenever it is dirty and wanted, and unloaded (GPU handles released, arrays
//! kept) when it leaves the streaming radius.

use cgmath::Point3;

use super::block::{BlockId, RenderGroup, AIR};
use crate::{core::WorldConfig, engine_state::rendering::MeshHandle};

pub mod boundary;

/// Highest water level a cell can hold.
pub const MAX_WATER_LEVEL: u8 = 7;
/// Bit marking a water cell as a self-sustaining source.
pub const WATER_SOURCE_FLAG: u8 = 0x80;

/// Encodes a water level for storage in a chunk's `water` array.
pub fn encode_water(level: u8, source: bool) -> u8 {
    let encoded = level.min(MAX_WATER_LEVEL) + 1;
    if source {
        encoded | WATER_SOURCE_FLAG
    } else {
        encoded
    }
}

/// The position `(dx, dy, dz)` away from `pos`.
///
/// Horizontal coordinates wrap at the edge of the `i32` range, so stepping off
/// either end of the plane never overflows.
#[inline]
pub fn offset(pos: Point3<i32>, dx: i32, dy: i32, dz: i32) -> Point3<i32> {
    Point3::new(pos.x.wrapping_add(dx), pos.y.wrapping_add(dy), pos.z.wrapping_add(dz))
}

/// Decodes a stored water byte into `(level, is_source)`, or `None` if unset.
pub fn decode_water(encoded: u8) -> Option<(u8, bool)> {
    let level_bits = encoded & !WATER_SOURCE_FLAG;
    if level_bits == 0 {
        return None;
    }
    Some((level_bits - 1, encoded & WATER_SOURCE_FLAG != 0))
}

/// Horizontal position of a chunk, in chunk units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkCoord { x, z }
    }

    /// The chunk `(dx, dz)` chunks away, wrapping like [`offset`].
    pub fn offset(self, dx: i32, dz: i32) -> ChunkCoord {
        ChunkCoord::new(self.x.wrapping_add(dx), self.z.wrapping_add(dz))
    }

    /// The four axis-aligned neighbours in the order -X, +X, -Z, +Z.
    pub fn neighbors(self) -> [ChunkCoord; 4] {
        [self.offset(-1, 0), self.offset(1, 0), self.offset(0, -1), self.offset(0, 1)]
    }

    /// Chebyshev distance, matching the square streaming radius.
    pub fn distance(self, other: ChunkCoord) -> i64 {
        let dx = (self.x as i64 - other.x as i64).abs();
        let dz = (self.z as i64 - other.z as i64).abs();
        dx.max(dz)
    }

    /// Squared euclidean distance, used to order work inside one ring.
    pub fn distance_squared(self, other: ChunkCoord) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }
}

/// The static extent of every chunk in a world.
///
/// These are runtime parameters rather than constants so that tests can use
/// tiny synthetic chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkDimensions {
    pub width: usize,
    pub depth: usize,
    pub height: usize,
}

impl ChunkDimensions {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        ChunkDimensions { width, depth, height }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.chunk_width, config.height, config.chunk_depth)
    }

    /// Number of cells in one chunk.
    pub fn volume(&self) -> usize {
        self.width * self.depth * self.height
    }

    /// Array index of a chunk-local cell. Coordinates must be in range.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.width * (z + self.depth * y)
    }

    /// Whether `y` lies inside the world's vertical range.
    #[inline]
    pub fn contains_y(&self, y: i32) -> bool {
        y >= 0 && (y as usize) < self.height
    }

    /// Splits a world position into its chunk and chunk-local coordinates.
    ///
    /// # Returns
    /// `None` when `y` is outside the world. Horizontal coordinates are always valid.
    pub fn locate(&self, pos: Point3<i32>) -> Option<(ChunkCoord, [usize; 3])> {
        if !self.contains_y(pos.y) {
            return None;
        }
        let width = self.width as i32;
        let depth = self.depth as i32;
        let coord = ChunkCoord::new(pos.x.div_euclid(width), pos.z.div_euclid(depth));
        let local = [
            pos.x.rem_euclid(width) as usize,
            pos.y as usize,
            pos.z.rem_euclid(depth) as usize,
        ];
        Some((coord, local))
    }

    /// World-space block position of a chunk's (0, 0, 0) cell.
    ///
    /// Wraps for the partial chunks at the edge of the `i32` range.
    pub fn origin(&self, coord: ChunkCoord) -> Point3<i32> {
        Point3::new(
            coord.x.wrapping_mul(self.width as i32),
            0,
            coord.z.wrapping_mul(self.depth as i32),
        )
    }

    /// The chunk containing the world column `(x, z)`.
    pub fn chunk_at(&self, x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x.div_euclid(self.width as i32), z.div_euclid(self.depth as i32))
    }
}

/// One full-height column of blocks plus its streaming and meshing state.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates.
    pub coord: ChunkCoord,
    /// Block identifiers, X-fastest then Z then Y.
    pub blocks: Vec<BlockId>,
    /// Encoded water levels, parallel to `blocks`.
    pub water: Vec<u8>,

    pub generated: bool,
    /// The chunk currently owns GPU resources.
    pub loaded: bool,
    /// Block data changed since the last applied mesh.
    pub dirty: bool,
    pub gen_queued: bool,
    pub mesh_queued: bool,
    pub mesh_in_flight: bool,
    /// Dirtied again while a mesh job was outstanding.
    pub mesh_needs_rebuild: bool,
    /// Inside the current streaming radius.
    pub should_be_loaded: bool,

    /// Id of the outstanding mesh job, if any.
    pub mesh_job: Option<u64>,
    /// GPU mesh handle per render group.
    pub meshes: [Option<MeshHandle>; 3],
}

impl Chunk {
    /// Creates an empty, ungenerated chunk.
    pub fn new(coord: ChunkCoord, dims: ChunkDimensions) -> Self {
        Chunk {
            coord,
            blocks: vec![AIR; dims.volume()],
            water: vec![0; dims.volume()],
            generated: false,
            loaded: false,
            dirty: false,
            gen_queued: false,
            mesh_queued: false,
            mesh_in_flight: false,
            mesh_needs_rebuild: false,
            should_be_loaded: false,
            mesh_job: None,
            meshes: [None, None, None],
        }
    }

    /// Writes `block` only if the cell is currently air.
    ///
    /// # Returns
    /// `true` if the cell was written.
    pub fn set_if_empty(&mut self, index: usize, block: BlockId) -> bool {
        if self.blocks[index] != AIR {
            return false;
        }
        self.blocks[index] = block;
        true
    }

    /// Takes the mesh handle of one group, leaving the slot empty.
    pub fn take_mesh(&mut self, group: RenderGroup) -> Option<MeshHandle> {
        self.meshes[group.index()].take()
    }

    /// Takes every mesh handle, leaving the chunk without GPU resources.
    pub fn take_meshes(&mut self) -> Vec<MeshHandle> {
        self.loaded = false;
        self.meshes.iter_mut().filter_map(Option::take).collect()
    }

    /// Number of non-air cells.
    pub fn non_air_count(&self) -> usize {
        self.blocks.iter().filter(|&&block| block != AIR).count()
    }
}
