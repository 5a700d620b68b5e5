//! Greedy meshing: per-axis sweep planes, row-major rectangle growth over a face mask.
//!
//! For axis `d` the plane between cells `q` and `q + 1` (`q` in `-1 .. n`) sits at
//! coordinate `q + 1`. A mask cell holds the solid side's block id and the face sign
//! (`+1` when the lower cell is solid). Faces on the chunk boundary are owned by the
//! chunk holding the solid cell; the apron side only occludes.
//!
//! With `padding > 0` a first pass shrinks each maximal rectangle by `padding` on
//! every side, emits the interior, and freezes the ring. Rectangles too small to
//! shrink are frozen whole. Frozen cells come out as 1x1 quads in the second pass.

use std::time::Instant;

use strata_blocks::{AtlasUvTable, BlockId};

use crate::chunk::SurfaceLayer;
use crate::emit::{BuildSink, FaceRect, emit_face_rect};
use crate::face::Face;
use crate::grid::VoxelGrid;
use crate::layers::LayerMode;
use crate::scratch::with_scratch;

type MaskCell = (BlockId, i8);
const EMPTY: MaskCell = (0, 0);

struct Plane<'a> {
    mask: &'a mut [MaskCell],
    frozen: &'a mut [bool],
    max_u: usize,
    max_v: usize,
}

impl Plane<'_> {
    #[inline]
    fn at(&self, i: usize, j: usize) -> usize {
        i + j * self.max_u
    }

    /// Grows the widest then tallest rectangle of `key` from `(i, j)` over unfrozen cells.
    fn grow(&self, i: usize, j: usize, key: MaskCell) -> (usize, usize) {
        let idx = self.at(i, j);
        let mut w = 1usize;
        while i + w < self.max_u && self.mask[idx + w] == key && !self.frozen[idx + w] {
            w += 1;
        }
        let mut h = 1usize;
        'outer: while j + h < self.max_v {
            for k in 0..w {
                let idx2 = self.at(i + k, j + h);
                if self.mask[idx2] != key || self.frozen[idx2] {
                    break 'outer;
                }
            }
            h += 1;
        }
        (w, h)
    }

    fn fill(&mut self, i: usize, j: usize, w: usize, h: usize, cell: MaskCell) {
        for jj in j..j + h {
            for ii in i..i + w {
                let idx = self.at(ii, jj);
                self.mask[idx] = cell;
            }
        }
    }
}

/// Greedy-merges every layer along all three axes. Returns the quad count.
pub fn mesh_greedy(
    grid: &VoxelGrid,
    atlas: &AtlasUvTable,
    mode: LayerMode,
    padding: usize,
    builds: &mut impl BuildSink,
) -> usize {
    with_scratch(|scratch| {
        let mut quads = 0usize;
        for &layer in mode.layers() {
            for d in 0..3 {
                let t0 = Instant::now();
                let u = (d + 1) % 3;
                let v = (d + 2) % 3;
                let len = grid.n[u] * grid.n[v];
                scratch.mask.clear();
                scratch.mask.resize(len, EMPTY);
                scratch.frozen.clear();
                scratch.frozen.resize(len, false);
                let mut plane = Plane {
                    mask: &mut scratch.mask,
                    frozen: &mut scratch.frozen,
                    max_u: grid.n[u],
                    max_v: grid.n[v],
                };
                let axis_quads =
                    sweep_axis(grid, atlas, mode, layer, d, padding, &mut plane, builds);
                quads += axis_quads;
                log::debug!(
                    target: "perf",
                    "ms={:.2} mesher_greedy axis={} layer={:?} scale={} quads={}",
                    t0.elapsed().as_secs_f32() * 1000.0,
                    ["X", "Y", "Z"][d],
                    layer,
                    grid.scale,
                    axis_quads
                );
            }
        }
        quads
    })
}

#[allow(clippy::too_many_arguments)]
fn sweep_axis(
    grid: &VoxelGrid,
    atlas: &AtlasUvTable,
    mode: LayerMode,
    layer: SurfaceLayer,
    d: usize,
    padding: usize,
    plane: &mut Plane<'_>,
    builds: &mut impl BuildSink,
) -> usize {
    let u = (d + 1) % 3;
    let v = (d + 2) % 3;
    let n_d = grid.n[d] as i32;
    let scale = grid.scale as f32;
    let mut quads = 0usize;

    for q in -1..n_d {
        // Mask
        for j in 0..plane.max_v {
            for i in 0..plane.max_u {
                let mut pa = [0i32; 3];
                pa[d] = q;
                pa[u] = i as i32;
                pa[v] = j as i32;
                let mut pb = pa;
                pb[d] = q + 1;
                let a = grid.get_arr(pa);
                let b = grid.get_arr(pb);
                let sa = mode.is_solid(layer, a);
                let sb = mode.is_solid(layer, b);
                let cell = if sa == sb {
                    EMPTY
                } else if sa {
                    if q >= 0 { (a, 1) } else { EMPTY }
                } else if q + 1 < n_d {
                    (b, -1)
                } else {
                    EMPTY
                };
                let idx = plane.at(i, j);
                plane.mask[idx] = cell;
                plane.frozen[idx] = false;
            }
        }

        let mut emit = |i: usize, j: usize, w: usize, h: usize, key: MaskCell| {
            let rect = FaceRect {
                face: Face::from_axis_sign(d, key.1 > 0),
                plane: q + 1,
                u: i as i32,
                v: j as i32,
                w: w as i32,
                h: h as i32,
                id: key.0,
            };
            emit_face_rect(builds, layer, atlas, rect, scale);
            quads += 1;
        };

        // Pass A: padded interiors, frozen rings.
        if padding > 0 {
            for j in 0..plane.max_v {
                let mut i = 0usize;
                while i < plane.max_u {
                    let idx = plane.at(i, j);
                    let key = plane.mask[idx];
                    if key == EMPTY || plane.frozen[idx] {
                        i += 1;
                        continue;
                    }
                    let (w, h) = plane.grow(i, j, key);
                    let iw = w as isize - 2 * padding as isize;
                    let ih = h as isize - 2 * padding as isize;
                    if iw > 0 && ih > 0 {
                        let (iw, ih) = (iw as usize, ih as usize);
                        emit(i + padding, j + padding, iw, ih, key);
                        plane.fill(i + padding, j + padding, iw, ih, EMPTY);
                    }
                    for jj in j..j + h {
                        for ii in i..i + w {
                            let idx2 = plane.at(ii, jj);
                            if plane.mask[idx2] != EMPTY {
                                plane.frozen[idx2] = true;
                            }
                        }
                    }
                    i += w;
                }
            }
        }

        // Pass B: frozen cells as 1x1, everything else greedy.
        for j in 0..plane.max_v {
            let mut i = 0usize;
            while i < plane.max_u {
                let idx = plane.at(i, j);
                let key = plane.mask[idx];
                if key == EMPTY {
                    i += 1;
                    continue;
                }
                if plane.frozen[idx] {
                    emit(i, j, 1, 1, key);
                    plane.mask[idx] = EMPTY;
                    plane.frozen[idx] = false;
                    i += 1;
                    continue;
                }
                let (w, h) = plane.grow(i, j, key);
                emit(i, j, w, h, key);
                plane.fill(i, j, w, h, EMPTY);
                i += w;
            }
        }
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_build::MeshBuild;
    use strata_chunk::{AirSampler, ChunkBuf, ChunkCoord, ChunkView};

    fn floor_grid(size: usize, extent: usize) -> VoxelGrid {
        let mut buf = ChunkBuf::new_cube(ChunkCoord::default(), size);
        for z in 0..extent {
            for x in 0..extent {
                buf.set_local(x, 1, z, 2);
            }
        }
        VoxelGrid::from_view(&ChunkView::new(&buf, &AirSampler))
    }

    fn y_quads(mb: &MeshBuild) -> usize {
        (0..mb.vertex_count() / 4)
            .filter(|q| mb.normal(q * 4).map(|n| n.y != 0.0).unwrap_or(false))
            .count()
    }

    #[test]
    fn floor_merges_to_one_quad_per_side() {
        let grid = floor_grid(8, 4);
        let mut mb = MeshBuild::default();
        let quads = mesh_greedy(&grid, &AtlasUvTable::default(), LayerMode::Single, 0, &mut mb);
        assert_eq!(quads, 6);
        assert_eq!(y_quads(&mb), 2);
        assert!((mb.surface_area() - (2.0 * 16.0 + 4.0 * 4.0)).abs() < 1e-4);
    }

    #[test]
    fn padding_freezes_ring() {
        let grid = floor_grid(8, 4);
        let mut mb = MeshBuild::default();
        mesh_greedy(&grid, &AtlasUvTable::default(), LayerMode::Single, 1, &mut mb);
        // Per horizontal face: one 2x2 interior plus 12 ring cells.
        assert_eq!(y_quads(&mb), 26);
        // Side strips are 4x1, too thin to pad, so they come out as 1x1 cells.
        assert_eq!(mb.vertex_count() / 4, 26 + 16);
        assert!((mb.surface_area() - 48.0).abs() < 1e-4);
    }

    #[test]
    fn boundary_faces_belong_to_solid_owner() {
        // Solid neighbor across -X, air inside: no face at x = 0 for this chunk.
        let buf = ChunkBuf::new_cube(ChunkCoord::default(), 2);
        let world = |x: i32, _y: i32, _z: i32| if x < 0 { 1u8 } else { 0u8 };
        let grid = VoxelGrid::from_view(&ChunkView::new(&buf, &world));
        let mut mb = MeshBuild::default();
        assert_eq!(mesh_greedy(&grid, &AtlasUvTable::default(), LayerMode::Single, 0, &mut mb), 0);
    }
}
