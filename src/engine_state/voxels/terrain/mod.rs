//! # Terrain Module
//!
//! Deterministic procedural generation of chunk contents.
//!
//! ## Pipeline
//!
//! For each column of a chunk:
//! 1. Height: continent, hill and detail noise sampled at domain-warped
//!    coordinates, plus a mountain bonus where the mountain mask is high.
//!    River and lake masks pull the surface below sea level.
//! 2. Column fill: bedrock at the floor, stone, 1-3 filler layers and a
//!    biome-dependent top block.
//! 3. Caves carved below the crust, ores swapped into stone.
//! 4. Source water from the surface up to sea level.
//!
//! Trees are placed last from a jittered grid (see [`trees`]).
//!
//! Generation only writes into air cells and reads nothing but the seed and
//! world coordinates, so rerunning it is a no-op and chunks can be generated in
//! any order.

use cgmath::Point3;

use super::{
    block::{block_type::BlockType, BlockId},
    chunk::{encode_water, Chunk, ChunkCoord, ChunkDimensions},
    chunk_store::ChunkStore,
};
use crate::core::WorldConfig;
use noise_layers::{sample2, sample2_unit, sample3, NoiseLayers, SALT_FILLER};

mod noise_layers;
mod trees;

/// Radius around the spawn column raised above sea level.
pub const SPAWN_PLATEAU_RADIUS: i32 = 6;
/// Radius around the spawn column kept free of trees.
pub const TREE_EXCLUSION_RADIUS: i32 = 4;
/// Cells closer than this to the surface are never carved.
const CAVE_MIN_DEPTH: i32 = 4;

/// Ore kinds: block, noise threshold, highest y as a fraction of world height,
/// sampling frequency. Rarer ores come later and win ties.
const ORES: [(BlockType, f64, f64, f64); 4] = [
    (BlockType::COAL_ORE, 0.55, 0.8, 0.12),
    (BlockType::IRON_ORE, 0.62, 0.6, 0.14),
    (BlockType::GOLD_ORE, 0.72, 0.32, 0.16),
    (BlockType::DIAMOND_ORE, 0.78, 0.18, 0.18),
];

/// Surface classification of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Biome {
    /// Surface at or below sea level.
    Ocean,
    Beach,
    Plains,
    Forest,
    Desert,
    Mountains,
}

/// Everything generation needs to know about one world column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnSample {
    /// `y` of the top solid block.
    pub height: i32,
    pub biome: Biome,
    pub top: BlockType,
    pub filler: BlockType,
    /// Number of filler layers under the top block.
    pub filler_depth: i32,
}

/// Seeded, stateless terrain generator.
pub struct TerrainGenerator {
    seed: u32,
    sea_level: i32,
    dims: ChunkDimensions,
    layers: NoiseLayers,
}

impl TerrainGenerator {
    pub fn new(config: &WorldConfig) -> Self {
        TerrainGenerator {
            seed: config.seed,
            sea_level: config.sea_level,
            dims: ChunkDimensions::from_config(config),
            layers: NoiseLayers::new(config.seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn sea_level(&self) -> i32 {
        self.sea_level
    }

    /// The designated spawn column: the centre of chunk (0, 0).
    fn spawn_column(&self) -> (i32, i32) {
        ((self.dims.width / 2) as i32, (self.dims.depth / 2) as i32)
    }

    /// The spawn column and its surface height.
    pub fn spawn_point(&self) -> Point3<i32> {
        let (x, z) = self.spawn_column();
        Point3::new(x, self.surface_height(x, z), z)
    }

    fn distance_squared_to_spawn(&self, x: i32, z: i32) -> i64 {
        let (sx, sz) = self.spawn_column();
        let dx = x as i64 - sx as i64;
        let dz = z as i64 - sz as i64;
        dx * dx + dz * dz
    }

    /// Height of the top solid block of a column.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.height_and_mountain(x, z).0
    }

    fn height_and_mountain(&self, x: i32, z: i32) -> (i32, f64) {
        let layers = &self.layers;
        let (fx, fz) = (x as f64, z as f64);
        let sea = self.sea_level as f64;
        let span = (self.dims.height as f64 - sea).max(1.0);

        let wx = fx + sample2(&layers.warp_x, fx, fz, 0.01) * 12.0;
        let wz = fz + sample2(&layers.warp_z, fx, fz, 0.01) * 12.0;

        let continent = sample2(&layers.continent, wx, wz, 0.004);
        let hills = sample2(&layers.hills, wx, wz, 0.02);
        let detail = sample2(&layers.detail, wx, wz, 0.08);
        let mountain = sample2_unit(&layers.mountain, wx, wz, 0.006);

        let mut height = sea + 2.0 + continent * span * 0.25 + hills * span * 0.12 + detail * 1.5;
        if mountain > 0.6 {
            height += (mountain - 0.6) / 0.4 * span * 0.6;
        }

        if sample2(&layers.river, wx, wz, 0.005).abs() < 0.03 {
            height = height.min(sea - 2.0);
        }
        if sample2(&layers.lake, fx, fz, 0.01) > 0.75 {
            height = height.min(sea - 3.0);
        }

        let r = SPAWN_PLATEAU_RADIUS as i64;
        if self.distance_squared_to_spawn(x, z) <= r * r {
            height = height.max(sea + 2.0);
        }

        let world_top = self.dims.height as i32 - 1;
        let max_surface = (self.dims.height as i32 - 8).max(self.sea_level + 2).min(world_top);
        ((height.floor() as i32).clamp(1.min(world_top), max_surface.max(0)), mountain)
    }

    /// Classifies the column at `(x, z)`.
    pub fn column(&self, x: i32, z: i32) -> ColumnSample {
        let (height, mountain) = self.height_and_mountain(x, z);
        let (fx, fz) = (x as f64, z as f64);
        let sea = self.sea_level;
        let span = (self.dims.height as i32 - sea).max(1) as f64;
        let altitude = (height - sea) as f64 / span;

        let moisture = sample2(&self.layers.moisture, fx, fz, 0.005);
        let temperature = sample2(&self.layers.temperature, fx, fz, 0.003) - altitude * 0.5;
        let rocky = mountain > 0.6 || altitude > 0.7;

        let biome = if height <= sea {
            Biome::Ocean
        } else if height <= sea + 1 {
            Biome::Beach
        } else if rocky {
            Biome::Mountains
        } else if temperature > 0.35 && moisture < -0.1 {
            Biome::Desert
        } else if moisture > 0.15 {
            Biome::Forest
        } else {
            Biome::Plains
        };

        let (top, filler) = match biome {
            Biome::Ocean | Biome::Beach | Biome::Desert => (BlockType::SAND, BlockType::SAND),
            Biome::Mountains if altitude > 0.75 => (BlockType::SNOW, BlockType::STONE),
            Biome::Mountains => (BlockType::STONE, BlockType::STONE),
            Biome::Plains | Biome::Forest => (BlockType::GRASS, BlockType::DIRT),
        };
        let filler_depth = 1 + (noise_layers::hash_column(self.seed, x, z, SALT_FILLER) % 3) as i32;

        ColumnSample {
            height,
            biome,
            top,
            filler,
            filler_depth,
        }
    }

    /// Whether the cell at `depth` below the surface is carved out as cave.
    fn is_cave(&self, x: i32, y: i32, z: i32, depth: i32) -> bool {
        if depth < CAVE_MIN_DEPTH || y <= 0 {
            return false;
        }
        let (fx, fy, fz) = (x as f64, y as f64, z as f64);
        let coarse = sample3(&self.layers.cave_coarse, fx, fy * 1.6, fz, 0.05);
        let fine = sample3(&self.layers.cave_fine, fx, fy, fz, 0.11);
        let blend = coarse * 0.7 + fine * 0.3;
        let threshold = 0.55 + (12 - depth).max(0) as f64 * 0.02;
        blend > threshold
    }

    /// The ore replacing stone at a cell, if any.
    fn ore_at(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        let (fx, fy, fz) = (x as f64, y as f64, z as f64);
        let height = self.dims.height as f64;
        ORES.iter()
            .zip(self.layers.ores.iter())
            .rev()
            .find(|((_, threshold, max_fraction, frequency), field)| {
                fy <= height * max_fraction && sample3(field, fx, fy, fz, *frequency) > *threshold
            })
            .map(|((ore, ..), _)| *ore)
    }

    /// The block generation places at `(x, y, z)` for a column sample.
    fn block_at(&self, column: &ColumnSample, x: i32, y: i32, z: i32) -> BlockType {
        if y == 0 {
            return BlockType::BEDROCK;
        }
        if y > column.height {
            return if y <= self.sea_level {
                BlockType::WATER
            } else {
                BlockType::AIR
            };
        }
        let depth = column.height - y;
        if self.is_cave(x, y, z, depth) {
            return BlockType::AIR;
        }
        if depth == 0 {
            column.top
        } else if depth <= column.filler_depth {
            column.filler
        } else {
            self.ore_at(x, y, z).unwrap_or(BlockType::STONE)
        }
    }

    /// Fills a chunk with terrain, writing only into air cells.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to populate; its `coord` selects the region
    /// * `dims` - Dimensions of the chunk arrays
    pub fn fill_chunk(&self, chunk: &mut Chunk, dims: ChunkDimensions) {
        let origin = dims.origin(chunk.coord);
        let source_water = encode_water(0, true);
        let water_id = BlockType::WATER.id();

        for lz in 0..dims.depth {
            for lx in 0..dims.width {
                let x = origin.x.wrapping_add(lx as i32);
                let z = origin.z.wrapping_add(lz as i32);
                let column = self.column(x, z);
                for y in 0..dims.height {
                    let block: BlockId = self.block_at(&column, x, y as i32, z).id();
                    if block == BlockType::AIR.id() {
                        continue;
                    }
                    let index = dims.index(lx, y, lz);
                    if chunk.set_if_empty(index, block) && block == water_id {
                        chunk.water[index] = source_water;
                    }
                }
            }
        }

        trees::place_trees(self, chunk, dims);
    }

    /// Generates a chunk in `store` if it is not generated yet.
    ///
    /// # Returns
    /// `true` if generation ran.
    pub fn generate(&self, store: &mut ChunkStore, coord: ChunkCoord) -> bool {
        let dims = store.dims();
        store.populate_with(coord, |chunk| self.fill_chunk(chunk, dims))
    }
}
