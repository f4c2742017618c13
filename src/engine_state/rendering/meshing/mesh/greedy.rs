//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent coplanar
//! faces with the same block, tile and render group into larger quads, reducing the
//! number of vertices a chunk needs.
//!
//! For each of the three axes and both face directions the chunk is cut into
//! slices. Each slice yields a 2D mask of visible faces, and the mask is swept
//! row by row: a run is grown along the first in-plane axis, then the whole run
//! is grown along the second axis while every cell still matches.

use cgmath::Point3;

use crate::engine_state::{
    rendering::{meshing::MeshContext, Vertex},
    voxels::{
        block::{block_side::BlockSide, BlockId, RenderGroup, AIR},
        chunk::{boundary::NeighborFaces, ChunkCoord},
    },
};

use super::{
    face::{MaskCell, Quad},
    mesh::MeshBuffers,
};

/// Read-only view of a chunk and its four boundary slices.
struct BlockView<'a> {
    size: [usize; 3],
    blocks: &'a [BlockId],
    neighbors: &'a NeighborFaces,
}

impl BlockView<'_> {
    /// Block at chunk-local `pos`, which may lie one cell outside the chunk
    /// along a single horizontal axis. Anything above or below the world is air.
    fn get(&self, pos: [i64; 3]) -> BlockId {
        let [width, height, depth] = self.size.map(|s| s as i64);
        let [x, y, z] = pos;
        if y < 0 || y >= height {
            return AIR;
        }
        let (ux, uy, uz) = (x as usize, y as usize, z as usize);
        if x < 0 {
            return self.neighbors.neg_x[uy * depth as usize + uz];
        }
        if x >= width {
            return self.neighbors.pos_x[uy * depth as usize + uz];
        }
        if z < 0 {
            return self.neighbors.neg_z[uy * width as usize + ux];
        }
        if z >= depth {
            return self.neighbors.pos_z[uy * width as usize + ux];
        }
        self.blocks[ux + width as usize * (uz + depth as usize * uy)]
    }
}

/// Builds the mesh of one chunk.
///
/// # Arguments
/// * `context` - Chunk dimensions and block registry
/// * `coord` - Chunk position, used for world-space tiles and water UVs
/// * `blocks` - The chunk's block array
/// * `neighbors` - Boundary slices of the four horizontal neighbours
///
/// # Returns
/// One buffer set per render group. Faces are emitted only for blocks inside
/// the chunk; neighbour slices only occlude.
///
/// # Panics
/// If `blocks` or a boundary slice does not match the context's dimensions.
pub fn greedy_mesh(
    context: &MeshContext,
    coord: ChunkCoord,
    blocks: &[BlockId],
    neighbors: &NeighborFaces,
) -> MeshBuffers {
    let dims = context.dims;
    assert_eq!(blocks.len(), dims.volume(), "block array does not match chunk dimensions");
    assert_eq!(neighbors.neg_x.len(), dims.height * dims.depth, "bad -X boundary slice");
    assert_eq!(neighbors.pos_x.len(), dims.height * dims.depth, "bad +X boundary slice");
    assert_eq!(neighbors.neg_z.len(), dims.height * dims.width, "bad -Z boundary slice");
    assert_eq!(neighbors.pos_z.len(), dims.height * dims.width, "bad +Z boundary slice");

    let view = BlockView {
        size: [dims.width, dims.height, dims.depth],
        blocks,
        neighbors,
    };
    let origin = dims.origin(coord);
    let mut mesh = MeshBuffers::new();

    for side in BlockSide::all() {
        for quad in side_quads(context, &view, origin, side) {
            emit_quad(&mut mesh, &quad, origin);
        }
    }
    mesh
}

/// Greedy-merged quads of every slice facing `side`.
fn side_quads(context: &MeshContext, view: &BlockView, origin: Point3<i32>, side: BlockSide) -> Vec<Quad> {
    let axis = side.axis();
    let (u_axis, v_axis) = ((axis + 1) % 3, (axis + 2) % 3);
    let (nu, nv) = (view.size[u_axis], view.size[v_axis]);
    let step: i64 = if side.is_positive() { 1 } else { -1 };
    let registry = context.registry.as_ref();

    let mut quads = Vec::new();
    let mut mask: Vec<Option<MaskCell>> = vec![None; nu * nv];

    for layer in 0..view.size[axis] {
        for j in 0..nv {
            for i in 0..nu {
                let mut pos = [0i64; 3];
                pos[axis] = layer as i64;
                pos[u_axis] = i as i64;
                pos[v_axis] = j as i64;
                let owner = view.get(pos);
                let mut across = pos;
                across[axis] += step;

                let group = registry.render_group(owner);
                mask[i + j * nu] = match group {
                    Some(group) if registry.render_group(view.get(across)) != Some(group) => {
                        let tile = registry.face_tile(
                            owner,
                            side,
                            origin.x.wrapping_add(pos[0] as i32),
                            pos[1] as i32,
                            origin.z.wrapping_add(pos[2] as i32),
                        );
                        Some(MaskCell { block: owner, tile, group })
                    }
                    _ => None,
                };
            }
        }

        let plane = if side.is_positive() { layer + 1 } else { layer };
        merge_mask(&mut mask, nu, nv, |u, v, width, height, cell| {
            quads.push(Quad {
                side,
                plane,
                u,
                v,
                width,
                height,
                cell,
            });
        });
    }
    quads
}

/// Sweeps a mask into maximal rectangles, clearing consumed cells.
///
/// `emit` receives `(u, v, width, height, cell)` for each rectangle.
fn merge_mask<F>(mask: &mut [Option<MaskCell>], nu: usize, nv: usize, mut emit: F)
where
    F: FnMut(usize, usize, usize, usize, MaskCell),
{
    for j in 0..nv {
        let mut i = 0;
        while i < nu {
            let Some(cell) = mask[i + j * nu] else {
                i += 1;
                continue;
            };

            let mut width = 1;
            while i + width < nu && mask[i + width + j * nu] == Some(cell) {
                width += 1;
            }

            let mut height = 1;
            'grow: while j + height < nv {
                let row = (j + height) * nu;
                for k in i..i + width {
                    if mask[k + row] != Some(cell) {
                        break 'grow;
                    }
                }
                height += 1;
            }

            for dv in 0..height {
                let row = (j + dv) * nu;
                mask[row + i..row + i + width].fill(None);
            }

            emit(i, j, width, height, cell);
            i += width;
        }
    }
}

fn emit_quad(mesh: &mut MeshBuffers, quad: &Quad, origin: Point3<i32>) {
    let (_, u_axis, v_axis) = quad.axes();
    let normal = quad.side.normal();
    let world_offset = [origin.x as f32, 0.0, origin.z as f32];
    let (w, h) = (quad.width as f32, quad.height as f32);
    let local_uvs = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];

    let corners = quad.corners();
    let vertices: [Vertex; 4] = std::array::from_fn(|n| {
        let position = corners[n].map(|c| c as f32);
        let uv = if quad.cell.group == RenderGroup::Water {
            [
                position[u_axis] + world_offset[u_axis],
                position[v_axis] + world_offset[v_axis],
            ]
        } else {
            local_uvs[n]
        };
        Vertex::new(position, normal, uv, quad.cell.tile)
    });

    mesh.group_mut(quad.cell.group)
        .push_quad(vertices, quad.side.is_positive());
}
