//! Surface nets: one vertex per active cell at the centroid of its edge crossings,
//! one quad per crossing lattice edge joining the four cells around it.
//!
//! Cells run `[-1, n)` so the quads of edges on the min boundary planes can be
//! built from apron samples. Only edges whose start corner lies in `[0, n)^3` are
//! emitted, so each lattice edge belongs to exactly one chunk.

use std::time::Instant;

use strata_geom::Vec3;

use crate::config::NormalMode;
use crate::density::DensityField;
use crate::marching::{IsoOptions, crossing_normal, edge_crossing, snap};
use crate::mc_tables::{CORNER_OFFSETS, EDGE_CORNERS};
use crate::mesh_build::MeshBuild;
use crate::scratch::with_scratch;

const NO_VERTEX: u32 = u32::MAX;

/// Meshes `field` into `build`. Returns the triangle count.
pub fn surface_nets(field: &DensityField, opts: IsoOptions, build: &mut MeshBuild) -> usize {
    let t0 = Instant::now();
    let n = field.n() as i32;
    let side = (n + 1) as usize;
    let iso = opts.iso;
    let with_normals = opts.normals == NormalMode::Gradient;
    let cell_index = |c: [i32; 3]| -> usize {
        ((c[2] + 1) as usize * side + (c[1] + 1) as usize) * side + (c[0] + 1) as usize
    };
    let inside = |p: [i32; 3]| field.get_arr(p) > iso;

    let tris = with_scratch(|scratch| {
        let cell_verts = &mut scratch.cell_verts;
        cell_verts.clear();
        cell_verts.resize(side * side * side, NO_VERTEX);

        // Vertices
        for z in -1..n {
            for y in -1..n {
                for x in -1..n {
                    let mut case = 0u8;
                    for (k, off) in CORNER_OFFSETS.iter().enumerate() {
                        if inside([x + off[0] as i32, y + off[1] as i32, z + off[2] as i32]) {
                            case |= 1 << k;
                        }
                    }
                    if case == 0 || case == 0xff {
                        continue;
                    }
                    let mut sum = Vec3::ZERO;
                    let mut nsum = Vec3::ZERO;
                    let mut count = 0u32;
                    for [ca, cb] in EDGE_CORNERS {
                        if (case >> ca) & 1 == (case >> cb) & 1 {
                            continue;
                        }
                        let (oa, ob) = (CORNER_OFFSETS[ca], CORNER_OFFSETS[cb]);
                        let mut lo = [x, y, z];
                        let mut axis = 0usize;
                        for a in 0..3 {
                            lo[a] += oa[a].min(ob[a]) as i32;
                            if oa[a] != ob[a] {
                                axis = a;
                            }
                        }
                        let (p, t) = edge_crossing(field, iso, lo, axis);
                        sum += p;
                        if with_normals {
                            nsum += crossing_normal(field, lo, axis, t);
                        }
                        count += 1;
                    }
                    let p = sum / count as f32;
                    let p = if opts.snap { snap(p) } else { p };
                    let vi = build.push_position(p);
                    if with_normals {
                        let nrm = nsum.normalized();
                        build.norm.extend_from_slice(&[nrm.x, nrm.y, nrm.z]);
                    }
                    cell_verts[cell_index([x, y, z])] = vi;
                }
            }
        }

        // Quads
        let mut tris = 0usize;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let s = [x, y, z];
                    let s_in = inside(s);
                    for d in 0..3 {
                        let mut e = s;
                        e[d] += 1;
                        if inside(e) == s_in {
                            continue;
                        }
                        let u = (d + 1) % 3;
                        let v = (d + 2) % 3;
                        let mut c00 = s;
                        c00[u] -= 1;
                        c00[v] -= 1;
                        let mut c10 = s;
                        c10[v] -= 1;
                        let c11 = s;
                        let mut c01 = s;
                        c01[u] -= 1;
                        let mut q = [
                            cell_verts[cell_index(c00)],
                            cell_verts[cell_index(c10)],
                            cell_verts[cell_index(c11)],
                            cell_verts[cell_index(c01)],
                        ];
                        let valid = q.iter().all(|&i| i != NO_VERTEX);
                        debug_assert!(valid, "crossing edge next to an inactive cell");
                        if !valid {
                            continue;
                        }
                        if !s_in {
                            q.reverse();
                        }
                        if build.push_triangle(q[0], q[1], q[2]) {
                            tris += 1;
                        }
                        if build.push_triangle(q[0], q[2], q[3]) {
                            tris += 1;
                        }
                    }
                }
            }
        }
        tris
    });

    log::debug!(
        target: "perf",
        "ms={:.2} mesher_surface_nets n={} stride={} verts={} tris={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        n,
        field.stride(),
        build.vertex_count(),
        tris
    );
    tris
}
