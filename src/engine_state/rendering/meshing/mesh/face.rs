use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, RenderGroup};

/// One visible unit face in a slice mask.
///
/// Two cells merge into the same rectangle only if every field matches; the
/// side is shared by the whole mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskCell {
    /// The block owning the face
    pub block: BlockId,
    /// Atlas tile for this face of the block
    pub tile: u32,
    pub group: RenderGroup,
}

/// A merged rectangle of coplanar faces.
///
/// Coordinates are chunk-local. `u` and `v` are the in-plane axes of the face
/// axis: `u = (axis + 1) % 3`, `v = (axis + 2) % 3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub side: BlockSide,
    /// Coordinate of the face plane along the face axis
    pub plane: usize,
    pub u: usize,
    pub v: usize,
    /// Extent along `u`, in blocks
    pub width: usize,
    /// Extent along `v`, in blocks
    pub height: usize,
    pub cell: MaskCell,
}

impl Quad {
    /// The face axis and its two in-plane axes.
    pub fn axes(&self) -> (usize, usize, usize) {
        let axis = self.side.axis();
        (axis, (axis + 1) % 3, (axis + 2) % 3)
    }

    /// Corner positions in counter-clockwise order seen from the positive side
    /// of the face axis: origin, `+u`, `+u+v`, `+v`.
    pub fn corners(&self) -> [[usize; 3]; 4] {
        let (axis, u_axis, v_axis) = self.axes();
        let mut base = [0; 3];
        base[axis] = self.plane;
        base[u_axis] = self.u;
        base[v_axis] = self.v;

        let mut corners = [base; 4];
        corners[1][u_axis] += self.width;
        corners[2][u_axis] += self.width;
        corners[2][v_axis] += self.height;
        corners[3][v_axis] += self.height;
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_face_corners() {
        let quad = Quad {
            side: BlockSide::TOP,
            plane: 5,
            u: 1,
            v: 2,
            width: 3,
            height: 4,
            cell: MaskCell {
                block: 1,
                tile: 0,
                group: RenderGroup::Opaque,
            },
        };
        // Y faces span Z (u) and X (v).
        assert_eq!(quad.corners(), [[2, 5, 1], [2, 5, 4], [6, 5, 4], [6, 5, 1]]);
    }
}
