//! # Block Type Module
//!
//! The built-in block set. The world core only stores raw identifiers; this enum
//! names the identifiers the terrain generator places and the default registry
//! knows how to classify.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockId;

/// Enumerates the built-in block types.
///
/// The `FromPrimitive` derive allows validating raw identifiers coming from
/// snapshots or the network.
#[allow(non_camel_case_types)]
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Never rendered and never counted as a block.
    AIR = 0,
    STONE = 1,
    DIRT = 2,
    GRASS = 3,
    SAND = 4,
    /// Liquid; the only type with a meaningful water level.
    WATER = 5,
    LOG = 6,
    /// Alpha-tested foliage rendered in the cutout group.
    LEAVES = 7,
    GRAVEL = 8,
    COAL_ORE = 9,
    IRON_ORE = 10,
    GOLD_ORE = 11,
    DIAMOND_ORE = 12,
    BEDROCK = 13,
    SNOW = 14,
    GLASS = 15,
}

impl BlockType {
    /// Converts a raw identifier into a `BlockType`.
    ///
    /// # Returns
    /// `None` if the identifier is not part of the built-in set.
    pub fn from_id(id: BlockId) -> Option<Self> {
        FromPrimitive::from_u16(id)
    }

    /// The raw identifier stored in chunk arrays.
    pub fn id(self) -> BlockId {
        self as BlockId
    }
}
