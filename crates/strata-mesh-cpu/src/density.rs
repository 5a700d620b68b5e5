//! LOD density sampling: reduces a chunk's blocks to a scalar field or a coarse voxel grid.
//!
//! Sample `i` (per axis, `-1 ..= n + 1`) sits at world coordinate `origin + i * stride`
//! where `n = N / stride`. The same formula holds in every chunk, so two chunks sampling
//! a shared boundary read identical source boxes and produce identical values.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use strata_blocks::{AIR, BlockId};
use strata_chunk::{BlockWindow, ChunkView};
use strata_geom::Vec3;

use crate::constants::COARSE_SOLID_FRACTION;
use crate::grid::VoxelGrid;
use crate::scratch::with_scratch;

/// Which scalar the sampler produces. Both read "value > iso" as inside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Fraction of solid voxels in the `stride^3` box at each sample; iso 0.5.
    Occupancy,
    /// Approximate signed distance in voxels, positive inside; iso 0.
    Sdf,
}

impl FieldKind {
    pub fn default_iso(self) -> f32 {
        match self {
            FieldKind::Occupancy => 0.5,
            FieldKind::Sdf => 0.0,
        }
    }
}

/// Scalar samples on a `(n + 3)^3` lattice covering indices `-1 ..= n + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    n: usize,
    stride: usize,
    origin: [i32; 3],
    values: Vec<f32>,
}

impl DensityField {
    /// Builds a field from a function of the sample's world position.
    pub fn from_fn(
        n: usize,
        stride: usize,
        origin: [i32; 3],
        mut f: impl FnMut([i32; 3]) -> f32,
    ) -> Self {
        let side = n + 3;
        let mut values = Vec::with_capacity(side * side * side);
        let s = stride as i32;
        for k in -1..=(n as i32 + 1) {
            for j in -1..=(n as i32 + 1) {
                for i in -1..=(n as i32 + 1) {
                    values.push(f([
                        origin[0] + i * s,
                        origin[1] + j * s,
                        origin[2] + k * s,
                    ]));
                }
            }
        }
        Self {
            n,
            stride,
            origin,
            values,
        }
    }

    /// Cells per axis; corners run `0 ..= n`.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn origin(&self) -> [i32; 3] {
        self.origin
    }

    #[inline]
    fn index(&self, i: i32, j: i32, k: i32) -> usize {
        let side = self.n + 3;
        ((k + 1) as usize * side + (j + 1) as usize) * side + (i + 1) as usize
    }

    /// Sample at lattice index; indices are clamped to the apron.
    #[inline]
    pub fn get(&self, i: i32, j: i32, k: i32) -> f32 {
        let hi = self.n as i32 + 1;
        let (i, j, k) = (i.clamp(-1, hi), j.clamp(-1, hi), k.clamp(-1, hi));
        self.values[self.index(i, j, k)]
    }

    #[inline]
    pub fn get_arr(&self, p: [i32; 3]) -> f32 {
        self.get(p[0], p[1], p[2])
    }

    /// Chunk-local position of a lattice index.
    #[inline]
    pub fn local_pos(&self, p: [i32; 3]) -> Vec3 {
        let s = self.stride as f32;
        Vec3::new(p[0] as f32 * s, p[1] as f32 * s, p[2] as f32 * s)
    }

    /// Field gradient at a lattice index, per voxel. Central differences inside the
    /// lattice, one-sided on the apron.
    pub fn gradient(&self, p: [i32; 3]) -> Vec3 {
        let hi = self.n as i32 + 1;
        let mut g = [0.0f32; 3];
        for (axis, out) in g.iter_mut().enumerate() {
            let mut lo = p;
            let mut up = p;
            lo[axis] = (p[axis] - 1).max(-1);
            up[axis] = (p[axis] + 1).min(hi);
            let span = (up[axis] - lo[axis]).max(1) as f32 * self.stride as f32;
            *out = (self.get_arr(up) - self.get_arr(lo)) / span;
        }
        Vec3::from_array(g)
    }

    /// Gradient at a fractional lattice position, blended between the two lattice
    /// corners of the edge it lies on.
    pub fn gradient_on_edge(&self, a: [i32; 3], b: [i32; 3], t: f32) -> Vec3 {
        self.gradient(a).lerp(self.gradient(b), t)
    }
}

/// Manhattan offsets within `radius`, nearest first.
fn shell_offsets(radius: i32) -> Vec<([i32; 3], i32)> {
    let mut out = Vec::new();
    for dz in -radius..=radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d = dx.abs() + dy.abs() + dz.abs();
                if d <= radius {
                    out.push(([dx, dy, dz], d));
                }
            }
        }
    }
    out.sort_by_key(|&(_, d)| d);
    out
}

/// Samples the chunk behind `view` at `stride`.
///
/// `sdf_radius` is the search radius in samples for [`FieldKind::Sdf`]; it is ignored
/// for occupancy. Every non-air id counts as solid.
pub fn sample_density(
    view: &ChunkView<'_>,
    stride: usize,
    kind: FieldKind,
    sdf_radius: usize,
) -> DensityField {
    let t0 = Instant::now();
    let stride = stride.max(1);
    let size = view.buf.sx;
    let n = size / stride;
    let origin = view.buf.origin();
    let s = stride as i32;
    let reach = match kind {
        FieldKind::Occupancy => 0,
        FieldKind::Sdf => (sdf_radius.max(1) * stride) as i32,
    };
    let min = [origin[0] - s - reach, origin[1] - s - reach, origin[2] - s - reach];
    let span = (n + 3) * stride + 2 * reach as usize;
    let dims = [span, span, span];

    let field = with_scratch(|scratch| {
        let storage = std::mem::take(&mut scratch.window);
        let window = BlockWindow::capture_into(view, min, dims, storage);
        let field = match kind {
            FieldKind::Occupancy => {
                let total = (stride * stride * stride) as f32;
                DensityField::from_fn(n, stride, origin, |p| {
                    let mut solid = 0u32;
                    for z in 0..s {
                        for y in 0..s {
                            for x in 0..s {
                                if window.get(p[0] + x, p[1] + y, p[2] + z) != AIR {
                                    solid += 1;
                                }
                            }
                        }
                    }
                    solid as f32 / total
                })
            }
            FieldKind::Sdf => {
                let offsets = shell_offsets(reach);
                let miss = reach + 1;
                DensityField::from_fn(n, stride, origin, |p| {
                    let mut near_solid = miss;
                    let mut near_empty = miss;
                    for &([dx, dy, dz], d) in &offsets {
                        if near_solid < miss && near_empty < miss {
                            break;
                        }
                        let solid = window.get(p[0] + dx, p[1] + dy, p[2] + dz) != AIR;
                        if solid && near_solid == miss {
                            near_solid = d;
                        } else if !solid && near_empty == miss {
                            near_empty = d;
                        }
                    }
                    ((near_empty - near_solid) as f32).clamp(-(reach as f32), reach as f32)
                })
            }
        };
        scratch.window = window.into_storage();
        field
    });
    log::debug!(
        target: "perf",
        "ms={:.2} density_sample kind={:?} stride={} n={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        kind,
        stride,
        n
    );
    field
}

/// Reduces the chunk to `N / stride` cells per axis (plus apron) for the blocky
/// meshers. A cell is solid when at least half its box is solid; its id is the most
/// frequent solid id, ties to the lowest.
pub fn coarse_grid(view: &ChunkView<'_>, stride: usize) -> VoxelGrid {
    let stride = stride.max(1);
    if stride == 1 {
        return VoxelGrid::from_view(view);
    }
    let t0 = Instant::now();
    let size = view.buf.sx;
    let n = size / stride;
    let origin = view.buf.origin();
    let s = stride as i32;
    let min = [origin[0] - s, origin[1] - s, origin[2] - s];
    let span = (n + 2) * stride;
    let total = (stride * stride * stride) as f32;

    let grid = with_scratch(|scratch| {
        let storage = std::mem::take(&mut scratch.window);
        let window = BlockWindow::capture_into(view, min, [span, span, span], storage);
        let mut cells = std::mem::take(&mut scratch.cells);
        cells.clear();
        cells.reserve((n + 2) * (n + 2) * (n + 2));
        let mut counts: Vec<(BlockId, u32)> = Vec::with_capacity(8);
        for cz in -1..=n as i32 {
            for cy in -1..=n as i32 {
                for cx in -1..=n as i32 {
                    counts.clear();
                    let base = [origin[0] + cx * s, origin[1] + cy * s, origin[2] + cz * s];
                    let mut solid = 0u32;
                    for z in 0..s {
                        for y in 0..s {
                            for x in 0..s {
                                let id = window.get(base[0] + x, base[1] + y, base[2] + z);
                                if id == AIR {
                                    continue;
                                }
                                solid += 1;
                                match counts.iter_mut().find(|(c, _)| *c == id) {
                                    Some((_, k)) => *k += 1,
                                    None => counts.push((id, 1)),
                                }
                            }
                        }
                    }
                    let id = if solid as f32 / total >= COARSE_SOLID_FRACTION {
                        counts
                            .iter()
                            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                            .map(|&(id, _)| id)
                            .unwrap_or(AIR)
                    } else {
                        AIR
                    };
                    cells.push(id);
                }
            }
        }
        scratch.window = window.into_storage();
        VoxelGrid::from_cells([n, n, n], stride, cells)
    });
    log::debug!(
        target: "perf",
        "ms={:.2} coarse_grid stride={} n={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        stride,
        n
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::{AirSampler, ChunkBuf, ChunkCoord};

    fn half_filled(size: usize) -> ChunkBuf {
        let mut buf = ChunkBuf::new_cube(ChunkCoord::new(1, 0, 0), size);
        for z in 0..size {
            for y in 0..size / 2 {
                for x in 0..size {
                    buf.set_local(x, y, z, 3);
                }
            }
        }
        buf
    }

    #[test]
    fn occupancy_counts_box_fraction() {
        let buf = half_filled(4);
        let view = ChunkView::new(&buf, &AirSampler);
        let f = sample_density(&view, 1, FieldKind::Occupancy, 0);
        assert_eq!(f.n(), 4);
        assert_eq!(f.get(0, 0, 0), 1.0);
        assert_eq!(f.get(0, 2, 0), 0.0);
        assert_eq!(f.get(-1, 0, 0), 0.0);

        let f2 = sample_density(&view, 2, FieldKind::Occupancy, 0);
        assert_eq!(f2.n(), 2);
        assert_eq!(f2.get(0, 0, 0), 1.0);
        assert_eq!(f2.get(0, 1, 0), 0.0);
    }

    #[test]
    fn sdf_is_positive_inside() {
        let buf = half_filled(8);
        let view = ChunkView::new(&buf, &AirSampler);
        let f = sample_density(&view, 1, FieldKind::Sdf, 2);
        assert_eq!(f.get(4, 3, 4), 1.0);
        assert_eq!(f.get(4, 4, 4), -1.0);
        assert_eq!(f.get(4, 1, 4), 2.0);
        assert_eq!(f.get(4, 7, 4), -2.0);
        assert!(f.gradient([4, 4, 4]).y < 0.0);
    }

    #[test]
    fn neighbors_sample_identical_boundary() {
        let world = |_x: i32, y: i32, _z: i32| if y < 3 { 1u8 } else { 0u8 };
        let a = ChunkBuf::from_sampler(ChunkCoord::new(0, 0, 0), 8, &world);
        let b = ChunkBuf::from_sampler(ChunkCoord::new(1, 0, 0), 8, &world);
        let fa = sample_density(&ChunkView::new(&a, &world), 2, FieldKind::Occupancy, 0);
        let fb = sample_density(&ChunkView::new(&b, &world), 2, FieldKind::Occupancy, 0);
        for k in 0..=4 {
            for j in 0..=4 {
                assert_eq!(fa.get(4, j, k), fb.get(0, j, k));
            }
        }
    }

    #[test]
    fn coarse_cells_use_majority_and_lowest_tie() {
        let mut buf = ChunkBuf::new_cube(ChunkCoord::default(), 4);
        // Cell (0,0,0) at stride 2: four 5s and four 2s -> tie, lowest wins.
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    buf.set_local(x, y, z, if x == 0 { 5 } else { 2 });
                }
            }
        }
        // Cell (1,0,0): three solid of eight -> air.
        buf.set_local(2, 0, 0, 4);
        buf.set_local(3, 0, 0, 4);
        buf.set_local(2, 1, 0, 4);
        let g = coarse_grid(&ChunkView::new(&buf, &AirSampler), 2);
        assert_eq!(g.n, [2, 2, 2]);
        assert_eq!(g.scale, 2);
        assert_eq!(g.get(0, 0, 0), 2);
        assert_eq!(g.get(1, 0, 0), AIR);
    }
}
