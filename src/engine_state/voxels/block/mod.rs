//! # Block Module
//!
//! Block identifiers, render-group classification and the registry seam through
//! which the surrounding game supplies per-block rendering facts.
//!
//! The core never decides what a block looks like. The mesher and the terrain
//! generator talk to an injected [`BlockRegistry`], which keeps both testable
//! with fixture block sets.

use block_side::BlockSide;
use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The raw block identifier stored in chunk arrays. `0` is air.
pub type BlockId = u16;

/// Identifier of empty space.
pub const AIR: BlockId = BlockType::AIR as BlockId;
/// Identifier of the only block type that carries a water level.
pub const WATER: BlockId = BlockType::WATER as BlockId;

/// The closed set of draw batches a block can belong to.
///
/// A face is drawn only between blocks of different groups, or between a block
/// and air, so the group doubles as the visibility class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderGroup {
    Opaque = 0,
    Cutout = 1,
    Water = 2,
}

impl RenderGroup {
    /// All groups in buffer order.
    pub const ALL: [RenderGroup; 3] = [RenderGroup::Opaque, RenderGroup::Cutout, RenderGroup::Water];

    /// Index of the group's buffer inside a mesh.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-block rendering facts supplied by the block/atlas collaborator.
///
/// Implementations must be immutable once shared: mesh workers hold the
/// registry behind an `Arc` and read it concurrently.
pub trait BlockRegistry: Send + Sync {
    /// The render group of `block`, or `None` for air and unknown identifiers.
    fn render_group(&self, block: BlockId) -> Option<RenderGroup>;

    /// Atlas tile drawn on `side` of `block` at world position `(x, y, z)`.
    ///
    /// The position allows random texture variants; returning the same tile for
    /// neighbouring blocks is what lets the greedy mesher merge them.
    fn face_tile(&self, block: BlockId, side: BlockSide, x: i32, y: i32, z: i32) -> u32;

    /// Whether `block` is a valid identifier. Used to reject snapshot entries.
    fn is_known(&self, block: BlockId) -> bool;
}

/// Maps each built-in block type to its tile index for each face.
///
/// The inner array is in [`BlockSide`] order: [Front, Back, Bottom, Top, Left, Right]
static BLOCK_TYPE_TO_TILE_INDICES: phf::Map<u16, [u32; 6]> = phf::phf_map! {
    1u16 => [0, 0, 0, 0, 0, 0],      // STONE
    2u16 => [1, 1, 1, 1, 1, 1],      // DIRT
    3u16 => [2, 2, 1, 3, 2, 2],      // GRASS (top: 3, bottom: dirt, sides: 2)
    4u16 => [4, 4, 4, 4, 4, 4],      // SAND
    5u16 => [5, 5, 5, 5, 5, 5],      // WATER
    6u16 => [6, 6, 7, 7, 6, 6],      // LOG (rings on top and bottom)
    7u16 => [8, 8, 8, 8, 8, 8],      // LEAVES
    8u16 => [9, 9, 9, 9, 9, 9],      // GRAVEL
    9u16 => [10, 10, 10, 10, 10, 10], // COAL_ORE
    10u16 => [11, 11, 11, 11, 11, 11], // IRON_ORE
    11u16 => [12, 12, 12, 12, 12, 12], // GOLD_ORE
    12u16 => [13, 13, 13, 13, 13, 13], // DIAMOND_ORE
    13u16 => [14, 14, 14, 14, 14, 14], // BEDROCK
    14u16 => [15, 15, 15, 15, 15, 15], // SNOW
    15u16 => [16, 16, 16, 16, 16, 16], // GLASS
};

/// Registry for the built-in [`BlockType`] set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBlockRegistry;

impl BlockRegistry for DefaultBlockRegistry {
    fn render_group(&self, block: BlockId) -> Option<RenderGroup> {
        match BlockType::from_id(block)? {
            BlockType::AIR => None,
            BlockType::WATER => Some(RenderGroup::Water),
            BlockType::LEAVES | BlockType::GLASS => Some(RenderGroup::Cutout),
            _ => Some(RenderGroup::Opaque),
        }
    }

    fn face_tile(&self, block: BlockId, side: BlockSide, _x: i32, _y: i32, _z: i32) -> u32 {
        BLOCK_TYPE_TO_TILE_INDICES
            .get(&block)
            .map(|tiles| tiles[side as usize])
            .unwrap_or(0)
    }

    fn is_known(&self, block: BlockId) -> bool {
        BlockType::from_id(block).is_some()
    }
}
