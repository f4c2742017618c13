//! Jittered-grid tree placement.
//!
//! The world is tiled by square grid cells; each cell holds one candidate trunk
//! position jittered by a column hash. Forests use a dense grid and plains a
//! sparse one, so a candidate only counts when the biome at its position asks
//! for the grid it came from. A tree is written cell by cell, keeping only the
//! cells inside the chunk being generated; the neighbouring chunk writes the
//! rest of the same tree when it generates.

use super::{
    noise_layers::{column_rng, hash_column, SALT_TREE, SALT_TREE_SHAPE},
    Biome, TerrainGenerator, TREE_EXCLUSION_RADIUS,
};
use crate::engine_state::voxels::{
    block::block_type::BlockType,
    chunk::{Chunk, ChunkDimensions},
};

const FOREST_GRID: i64 = 5;
const PLAINS_GRID: i64 = 11;
/// Horizontal reach of a canopy from its trunk.
const CANOPY_RADIUS: i32 = 2;

/// A tree anchored at the top block of its column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct TreeSite {
    x: i32,
    z: i32,
    /// `y` of the grass block under the trunk.
    ground: i32,
    trunk_height: i32,
}

pub(super) fn place_trees(generator: &TerrainGenerator, chunk: &mut Chunk, dims: ChunkDimensions) {
    // Bounds are widened to i64 so chunks at the edge of the plane stay in range.
    let (min_x, min_z) = chunk_min(chunk, dims);
    let reach = CANOPY_RADIUS as i64;
    let max_x = min_x + dims.width as i64 - 1 + reach;
    let max_z = min_z + dims.depth as i64 - 1 + reach;
    let (min_x, min_z) = (min_x - reach, min_z - reach);

    for (grid, biome) in [(FOREST_GRID, Biome::Forest), (PLAINS_GRID, Biome::Plains)] {
        for gz in min_z.div_euclid(grid)..=max_z.div_euclid(grid) {
            for gx in min_x.div_euclid(grid)..=max_x.div_euclid(grid) {
                if let Some(site) = candidate(generator, grid, biome, gx, gz) {
                    write_tree(site, chunk, dims);
                }
            }
        }
    }
}

/// World position of a chunk's first column, unwrapped.
fn chunk_min(chunk: &Chunk, dims: ChunkDimensions) -> (i64, i64) {
    (
        chunk.coord.x as i64 * dims.width as i64,
        chunk.coord.z as i64 * dims.depth as i64,
    )
}

/// The tree of grid cell `(gx, gz)`, if its jittered position accepts one.
///
/// Trunks that would fall outside the `i32` plane are rejected.
fn candidate(generator: &TerrainGenerator, grid: i64, biome: Biome, gx: i64, gz: i64) -> Option<TreeSite> {
    let salt = SALT_TREE ^ grid as u64;
    let jitter = hash_column(generator.seed(), gx as i32, gz as i32, salt);
    let x = i32::try_from(gx * grid + (jitter % grid as u64) as i64).ok()?;
    let z = i32::try_from(gz * grid + ((jitter >> 32) % grid as u64) as i64).ok()?;

    let r = TREE_EXCLUSION_RADIUS as i64;
    if generator.distance_squared_to_spawn(x, z) <= r * r {
        return None;
    }

    let column = generator.column(x, z);
    if column.biome != biome || column.top != BlockType::GRASS || column.height <= generator.sea_level() {
        return None;
    }

    let mut rng = column_rng(generator.seed(), x, z, SALT_TREE_SHAPE);
    Some(TreeSite {
        x,
        z,
        ground: column.height,
        trunk_height: rng.i32(4..=5),
    })
}

fn write_tree(site: TreeSite, chunk: &mut Chunk, dims: ChunkDimensions) {
    let (min_x, min_z) = chunk_min(chunk, dims);
    let (x, z) = (site.x as i64, site.z as i64);
    let mut put = |x: i64, y: i32, z: i64, block: BlockType| {
        let lx = x - min_x;
        let lz = z - min_z;
        if lx < 0 || lz < 0 || lx >= dims.width as i64 || lz >= dims.depth as i64 || !dims.contains_y(y) {
            return;
        }
        let index = dims.index(lx as usize, y as usize, lz as usize);
        chunk.set_if_empty(index, block.id());
    };

    let top = site.ground + site.trunk_height;
    for y in site.ground + 1..=top {
        put(x, y, z, BlockType::LOG);
    }

    for dy in -1..=2 {
        let radius = if dy <= 0 { CANOPY_RADIUS } else { 1 };
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let corner = dx.abs() == radius && dz.abs() == radius;
                if corner && (radius == CANOPY_RADIUS || dy == 2) {
                    continue;
                }
                put(x + dx as i64, top + dy, z + dz as i64, BlockType::LEAVES);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::WorldConfig, engine_state::voxels::chunk::ChunkCoord};

    fn generator() -> TerrainGenerator {
        TerrainGenerator::new(&WorldConfig::default())
    }

    #[test]
    fn test_candidates_are_deterministic() {
        let generator = generator();
        for gx in -6..6 {
            for gz in -6..6 {
                assert_eq!(
                    candidate(&generator, FOREST_GRID, Biome::Forest, gx, gz),
                    candidate(&generator, FOREST_GRID, Biome::Forest, gx, gz)
                );
            }
        }
    }

    #[test]
    fn test_no_tree_near_spawn() {
        let generator = generator();
        let spawn = generator.spawn_point();
        for grid in [FOREST_GRID, PLAINS_GRID] {
            for biome in [Biome::Forest, Biome::Plains] {
                for gx in -3..3 {
                    for gz in -3..3 {
                        if let Some(site) = candidate(&generator, grid, biome, gx, gz) {
                            let dx = (site.x - spawn.x) as i64;
                            let dz = (site.z - spawn.z) as i64;
                            assert!(dx * dx + dz * dz > (TREE_EXCLUSION_RADIUS as i64).pow(2));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_tree_is_clipped_to_chunk() {
        let dims = ChunkDimensions::new(4, 32, 4);
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), dims);
        let site = TreeSite {
            x: 0,
            z: 0,
            ground: 10,
            trunk_height: 4,
        };
        write_tree(site, &mut chunk, dims);

        assert_eq!(chunk.blocks[dims.index(0, 11, 0)], BlockType::LOG.id());
        assert_eq!(chunk.blocks[dims.index(0, 14, 0)], BlockType::LOG.id());
        assert_eq!(chunk.blocks[dims.index(2, 14, 0)], BlockType::LEAVES.id());
        assert_eq!(chunk.blocks[dims.index(2, 14, 2)], BlockType::AIR.id());
        assert_eq!(chunk.blocks[dims.index(0, 16, 0)], BlockType::LEAVES.id());
    }

    #[test]
    fn test_edge_of_plane_chunks_place_trees_without_overflow() {
        let generator = generator();
        let dims = ChunkDimensions::new(24, 32, 24);
        for coord in [dims.chunk_at(i32::MAX, i32::MAX), dims.chunk_at(i32::MIN, i32::MIN)] {
            let mut chunk = Chunk::new(coord, dims);
            place_trees(&generator, &mut chunk, dims);
        }

        let site = TreeSite {
            x: i32::MAX,
            z: i32::MIN,
            ground: 10,
            trunk_height: 4,
        };
        let edge = dims.chunk_at(i32::MAX, i32::MIN);
        let mut chunk = Chunk::new(edge, dims);
        write_tree(site, &mut chunk, dims);
        let lx = i32::MAX.rem_euclid(24) as usize;
        let lz = i32::MIN.rem_euclid(24) as usize;
        assert_eq!(chunk.blocks[dims.index(lx, 11, lz)], BlockType::LOG.id());
    }
}
