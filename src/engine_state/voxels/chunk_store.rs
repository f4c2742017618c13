//! # Chunk Store Module
//!
//! The sparse chunk map behind every block read and write. Only chunks that
//! have been accessed are kept in memory, which allows an effectively infinite
//! horizontal plane.
//!
//! ## Dirty Tracking
//!
//! Every write that changes a cell dirties the owning chunk, and a write on a
//! boundary cell also dirties the generated neighbour sharing that border. Each
//! transition into the dirty state is logged once; the mesh scheduler drains
//! the log every tick. A chunk dirtied again while its mesh job is in flight is
//! flagged `mesh_needs_rebuild` instead, and is requeued when the job lands.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - The non-air counter is maintained incrementally, never by rescanning
//! - Side effects touch the owning chunk and at most its four axis neighbours

use std::collections::HashMap;

use cgmath::Point3;

use super::{
    block::{BlockId, AIR, WATER},
    chunk::{
        boundary::NeighborFaces, decode_water, encode_water, Chunk, ChunkCoord, ChunkDimensions,
        WATER_SOURCE_FLAG,
    },
};

/// Options accompanying a block write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetBlockOptions {
    /// Water level stored with a water write. Defaults to 0 for new water and
    /// keeps the current level when overwriting water with non-source water.
    pub water_level: Option<u8>,
    /// Marks written water as a self-sustaining source.
    pub water_source: bool,
    /// The caller is performing a controlled write and the water system must
    /// not be notified.
    pub skip_water_propagation: bool,
}

impl SetBlockOptions {
    /// Options for a flowing-water write issued by the water system itself.
    pub fn flowing(level: u8) -> Self {
        SetBlockOptions {
            water_level: Some(level),
            water_source: false,
            skip_water_propagation: true,
        }
    }
}

/// Sparse map of chunks keyed by chunk coordinates.
pub struct ChunkStore {
    dims: ChunkDimensions,
    chunks: HashMap<ChunkCoord, Chunk>,
    /// World-wide count of non-air cells.
    non_air_blocks: u64,
    /// Chunks that became dirty since the last drain, in order.
    dirty_log: Vec<ChunkCoord>,
}

impl ChunkStore {
    /// Creates a new, empty store.
    pub fn new(dims: ChunkDimensions) -> Self {
        ChunkStore {
            dims,
            chunks: HashMap::new(),
            non_air_blocks: 0,
            dirty_log: Vec::new(),
        }
    }

    pub fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// Whether `pos` lies inside the world's vertical range.
    ///
    /// Horizontal coordinates are always valid.
    pub fn is_within_world(&self, pos: Point3<i32>) -> bool {
        self.dims.contains_y(pos.y)
    }

    /// Reads the block at a world position.
    ///
    /// # Returns
    /// The stored identifier, or air when `y` is out of range or the chunk has
    /// never been touched. Untouched cells of an ungenerated chunk are air.
    pub fn get_block(&self, pos: Point3<i32>) -> BlockId {
        let Some((coord, [x, y, z])) = self.dims.locate(pos) else {
            return AIR;
        };
        match self.chunks.get(&coord) {
            Some(chunk) => chunk.blocks[self.dims.index(x, y, z)],
            None => AIR,
        }
    }

    /// Writes a block at a world position, creating the owning chunk on demand.
    ///
    /// # Arguments
    /// * `pos` - World position of the cell
    /// * `block` - New identifier
    /// * `opts` - Water level and source flag for water writes
    ///
    /// # Returns
    /// The previous identifier. Writes outside the vertical range are ignored
    /// and return air.
    ///
    /// A write of the identifier already present is a no-op for dirty tracking
    /// and the block counter; for water it may still update the level.
    pub fn set_block(&mut self, pos: Point3<i32>, block: BlockId, opts: &SetBlockOptions) -> BlockId {
        let Some((coord, [x, y, z])) = self.dims.locate(pos) else {
            return AIR;
        };
        let dims = self.dims;
        let index = dims.index(x, y, z);
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, dims));

        let prev = chunk.blocks[index];
        if block == WATER {
            let keep_current = prev == WATER && opts.water_level.is_none() && !opts.water_source;
            if !keep_current {
                chunk.water[index] = encode_water(opts.water_level.unwrap_or(0), opts.water_source);
            }
        } else {
            chunk.water[index] = 0;
        }

        if prev == block {
            return prev;
        }
        chunk.blocks[index] = block;

        // Every non-air type counts, water included.
        match (prev == AIR, block == AIR) {
            (true, false) => self.non_air_blocks += 1,
            (false, true) => self.non_air_blocks = self.non_air_blocks.saturating_sub(1),
            _ => {}
        }

        self.mark_dirty(coord);
        let [neg_x, pos_x, neg_z, pos_z] = coord.neighbors();
        if x == 0 {
            self.mark_neighbor_dirty(neg_x);
        }
        if x == dims.width - 1 {
            self.mark_neighbor_dirty(pos_x);
        }
        if z == 0 {
            self.mark_neighbor_dirty(neg_z);
        }
        if z == dims.depth - 1 {
            self.mark_neighbor_dirty(pos_z);
        }

        prev
    }

    /// The water level of a water cell, or `None` for any other cell.
    pub fn get_water_level(&self, pos: Point3<i32>) -> Option<u8> {
        self.water_cell(pos).map(|(level, _)| level)
    }

    /// Whether the cell holds source water.
    pub fn is_water_source(&self, pos: Point3<i32>) -> bool {
        matches!(self.water_cell(pos), Some((_, true)))
    }

    /// The decoded `(level, is_source)` of a water cell.
    pub fn water_cell(&self, pos: Point3<i32>) -> Option<(u8, bool)> {
        let (coord, [x, y, z]) = self.dims.locate(pos)?;
        let chunk = self.chunks.get(&coord)?;
        let index = self.dims.index(x, y, z);
        if chunk.blocks[index] != WATER {
            return None;
        }
        decode_water(chunk.water[index])
    }

    /// Updates the level of a water cell, keeping its source flag.
    ///
    /// # Arguments
    /// * `level` - New level, clamped to the maximum
    /// * `clear_only` - Wipe the stored value without requiring a water cell
    ///
    /// # Returns
    /// `true` if the stored value was written.
    pub fn set_water_level(&mut self, pos: Point3<i32>, level: u8, clear_only: bool) -> bool {
        let Some((coord, [x, y, z])) = self.dims.locate(pos) else {
            return false;
        };
        let index = self.dims.index(x, y, z);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if clear_only {
            chunk.water[index] = 0;
            return true;
        }
        if chunk.blocks[index] != WATER {
            return false;
        }
        let source = chunk.water[index] & WATER_SOURCE_FLAG != 0;
        chunk.water[index] = encode_water(level, source);
        true
    }

    /// Runs `fill` on a chunk that has not been generated yet.
    ///
    /// The chunk is created if needed, flagged generated, its new blocks are
    /// added to the counter, and it is dirtied together with every generated
    /// neighbour so seams remesh.
    ///
    /// # Returns
    /// `false` if the chunk was already generated and `fill` did not run.
    pub fn populate_with<F>(&mut self, coord: ChunkCoord, fill: F) -> bool
    where
        F: FnOnce(&mut Chunk),
    {
        let dims = self.dims;
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, dims));
        if chunk.generated {
            return false;
        }

        let before = chunk.non_air_count();
        fill(chunk);
        assert_eq!(chunk.blocks.len(), dims.volume(), "generator resized chunk blocks");
        assert_eq!(chunk.water.len(), dims.volume(), "generator resized chunk water");
        let after = chunk.non_air_count();
        chunk.generated = true;
        chunk.gen_queued = false;

        self.non_air_blocks = (self.non_air_blocks + after as u64).saturating_sub(before as u64);
        self.mark_dirty(coord);
        for neighbor in coord.neighbors() {
            self.mark_neighbor_dirty(neighbor);
        }
        true
    }

    /// Marks a chunk dirty.
    ///
    /// # Returns
    /// `true` if this produced a new dirty event.
    pub fn mark_dirty(&mut self, coord: ChunkCoord) -> bool {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if chunk.mesh_in_flight {
            chunk.dirty = true;
            chunk.mesh_needs_rebuild = true;
            return false;
        }
        if chunk.dirty {
            return false;
        }
        chunk.dirty = true;
        self.dirty_log.push(coord);
        true
    }

    fn mark_neighbor_dirty(&mut self, coord: ChunkCoord) {
        if self.is_generated(coord) {
            self.mark_dirty(coord);
        }
    }

    /// Drains the chunks that became dirty since the last call.
    pub fn take_dirtied(&mut self) -> Vec<ChunkCoord> {
        std::mem::take(&mut self.dirty_log)
    }

    /// Copies the boundary planes of the four neighbours of `coord`.
    ///
    /// Absent or ungenerated neighbours contribute all-air slices.
    pub fn extract_neighbor_faces(&self, coord: ChunkCoord) -> NeighborFaces {
        let dims = self.dims;
        let mut faces = NeighborFaces::empty(dims);
        let [neg_x, pos_x, neg_z, pos_z] = coord.neighbors();

        if let Some(chunk) = self.generated_chunk(neg_x) {
            faces.neg_x = chunk.x_face(dims, dims.width - 1);
        }
        if let Some(chunk) = self.generated_chunk(pos_x) {
            faces.pos_x = chunk.x_face(dims, 0);
        }
        if let Some(chunk) = self.generated_chunk(neg_z) {
            faces.neg_z = chunk.z_face(dims, dims.depth - 1);
        }
        if let Some(chunk) = self.generated_chunk(pos_z) {
            faces.pos_z = chunk.z_face(dims, 0);
        }
        faces
    }

    fn generated_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord).filter(|chunk| chunk.generated)
    }

    pub fn is_generated(&self, coord: ChunkCoord) -> bool {
        self.generated_chunk(coord).is_some()
    }

    /// Whether the chunk owning `pos` has been generated.
    pub fn is_generated_at(&self, pos: Point3<i32>) -> bool {
        self.is_generated(self.dims.chunk_at(pos.x, pos.z))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Returns the chunk at `coord`, creating an empty one if needed.
    pub fn chunk_or_create(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let dims = self.dims;
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, dims))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Number of chunks held in memory.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// World-wide count of non-air cells, water cells included.
    pub fn non_air_block_count(&self) -> u64 {
        self.non_air_blocks
    }
}
