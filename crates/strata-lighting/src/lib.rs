//! Bounded flood-fill lightmap for one chunk.
//!
//! Light enters from block emitters inside the chunk and from the open sky above
//! each column, then spreads through non-opaque cells losing one level per step.
//! The fill never leaves a box padded by `MAX_LIGHT` around the chunk (and a few
//! chunks of sky above it), so the cost per chunk is bounded regardless of world size.
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::time::Instant;

use strata_blocks::{BlockId, BlockRegistry};
use strata_chunk::{BlockSampler, BlockWindow, ChunkBuf, ChunkView};

pub const MAX_LIGHT: u8 = 15;
/// How many chunk heights above the chunk are scanned for a sky-blocking block.
pub const SKY_SCAN_CHUNKS_UP: usize = 4;

/// Per-cell light levels `0..=MAX_LIGHT` for one chunk, same layout as [`ChunkBuf`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightGrid {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub levels: Vec<u8>,
}

impl LightGrid {
    pub fn new(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            sx,
            sy,
            sz,
            levels: vec![0; sx * sy * sz],
        }
    }

    /// Every cell fully lit.
    pub fn full(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            sx,
            sy,
            sz,
            levels: vec![MAX_LIGHT; sx * sy * sz],
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.levels[self.idx(x, y, z)]
    }

    /// Signed lookup clamped onto the grid; used for vertices sitting on chunk faces.
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32, z: i32) -> u8 {
        if self.levels.is_empty() {
            return 0;
        }
        let cx = x.clamp(0, self.sx as i32 - 1) as usize;
        let cy = y.clamp(0, self.sy as i32 - 1) as usize;
        let cz = z.clamp(0, self.sz as i32 - 1) as usize;
        self.get(cx, cy, cz)
    }
}

#[inline]
fn is_opaque(reg: &BlockRegistry, id: BlockId) -> bool {
    id != 0 && !reg.is_transparent(id)
}

/// Dense light box in world space; `0` means unlit.
struct LightBox {
    min: [i32; 3],
    dims: [usize; 3],
    light: Vec<u8>,
}

impl LightBox {
    #[inline]
    fn index(&self, p: [i32; 3]) -> Option<usize> {
        let mut l = [0usize; 3];
        for a in 0..3 {
            let d = p[a] - self.min[a];
            if d < 0 || d as usize >= self.dims[a] {
                return None;
            }
            l[a] = d as usize;
        }
        Some((l[2] * self.dims[1] + l[1]) * self.dims[0] + l[0])
    }

    fn raise(&mut self, q: &mut VecDeque<([i32; 3], u8)>, p: [i32; 3], level: u8) {
        if level == 0 {
            return;
        }
        let Some(i) = self.index(p) else {
            return;
        };
        if level > self.light[i] {
            self.light[i] = level;
            q.push_back((p, level));
        }
    }
}

/// Computes the chunk-local lightmap for `buf`, reading neighbors through `world`.
pub fn compute_chunk_lightmap(
    buf: &ChunkBuf,
    world: &dyn BlockSampler,
    reg: &BlockRegistry,
) -> LightGrid {
    let t0 = Instant::now();
    let view = ChunkView::new(buf, world);
    let [ox, oy, oz] = buf.origin();
    let (sx, sy, sz) = (buf.sx, buf.sy, buf.sz);
    let pad = MAX_LIGHT as i32;
    let scan_up = (sy * SKY_SCAN_CHUNKS_UP) as i32;

    let min = [ox - pad, oy - pad, oz - pad];
    let max = [
        ox + sx as i32 + pad,
        oy + sy as i32 + scan_up,
        oz + sz as i32 + pad,
    ];
    let dims = [
        (max[0] - min[0] + 1) as usize,
        (max[1] - min[1] + 1) as usize,
        (max[2] - min[2] + 1) as usize,
    ];
    let blocks = BlockWindow::capture(&view, min, dims);
    let mut lb = LightBox {
        min,
        dims,
        light: vec![0; dims[0] * dims[1] * dims[2]],
    };
    let mut q: VecDeque<([i32; 3], u8)> = VecDeque::new();

    for y in 0..sy {
        for z in 0..sz {
            for x in 0..sx {
                let em = reg.emission(buf.get_local(x, y, z)).min(MAX_LIGHT);
                if em > 0 {
                    lb.raise(&mut q, [ox + x as i32, oy + y as i32, oz + z as i32], em);
                }
            }
        }
    }

    // Sky reaches every column of the box straight down to its topmost opaque block.
    for gz in min[2]..=max[2] {
        for gx in min[0]..=max[0] {
            for gy in (min[1]..=max[1]).rev() {
                if is_opaque(reg, blocks.get(gx, gy, gz)) {
                    break;
                }
                lb.raise(&mut q, [gx, gy, gz], MAX_LIGHT);
            }
        }
    }

    const STEPS: [[i32; 3]; 6] = [
        [1, 0, 0],
        [-1, 0, 0],
        [0, 1, 0],
        [0, -1, 0],
        [0, 0, 1],
        [0, 0, -1],
    ];
    let mut visits = 0usize;
    while let Some((p, level)) = q.pop_front() {
        // Stale entry: the cell was raised again after this was queued.
        if lb.index(p).map(|i| lb.light[i]) != Some(level) {
            continue;
        }
        visits += 1;
        let next = level.saturating_sub(1);
        if next == 0 {
            continue;
        }
        for d in STEPS {
            let n = [p[0] + d[0], p[1] + d[1], p[2] + d[2]];
            if is_opaque(reg, blocks.get(n[0], n[1], n[2])) {
                continue;
            }
            lb.raise(&mut q, n, next);
        }
    }

    let mut grid = LightGrid::new(sx, sy, sz);
    for y in 0..sy {
        for z in 0..sz {
            for x in 0..sx {
                let p = [ox + x as i32, oy + y as i32, oz + z as i32];
                let v = lb.index(p).map(|i| lb.light[i]).unwrap_or(0);
                let i = grid.idx(x, y, z);
                grid.levels[i] = v;
            }
        }
    }
    log::debug!(
        target: "perf",
        "ms={:.2} light_bfs chunk={:?} visits={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        buf.coord,
        visits
    );
    grid
}
