//! One quad per exposed voxel face. Slow, but the reference the greedy mesher is checked against.

use std::time::Instant;

use strata_blocks::AtlasUvTable;

use crate::emit::{BuildSink, FaceRect, emit_face_rect};
use crate::face::Face;
use crate::grid::VoxelGrid;
use crate::layers::LayerMode;

/// Emits every visible face of every solid cell in `[0, n)`. Returns the quad count.
pub fn mesh_naive(
    grid: &VoxelGrid,
    atlas: &AtlasUvTable,
    mode: LayerMode,
    builds: &mut impl BuildSink,
) -> usize {
    let t0 = Instant::now();
    let scale = grid.scale as f32;
    let [nx, ny, nz] = grid.n;
    let mut quads = 0usize;
    for &layer in mode.layers() {
        for z in 0..nz as i32 {
            for y in 0..ny as i32 {
                for x in 0..nx as i32 {
                    let id = grid.get(x, y, z);
                    if !mode.is_solid(layer, id) {
                        continue;
                    }
                    let p = [x, y, z];
                    for face in Face::ALL {
                        let (dx, dy, dz) = face.delta();
                        if mode.is_solid(layer, grid.get(x + dx, y + dy, z + dz)) {
                            continue;
                        }
                        let d = face.axis();
                        let rect = FaceRect {
                            face,
                            plane: p[d] + i32::from(face.is_positive()),
                            u: p[(d + 1) % 3],
                            v: p[(d + 2) % 3],
                            w: 1,
                            h: 1,
                            id,
                        };
                        emit_face_rect(builds, layer, atlas, rect, scale);
                        quads += 1;
                    }
                }
            }
        }
    }
    log::debug!(
        target: "perf",
        "ms={:.2} mesher_naive dims=({}, {}, {}) scale={} quads={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        nx,
        ny,
        nz,
        grid.scale,
        quads
    );
    quads
}
