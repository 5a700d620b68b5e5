//! Table-driven marching cubes over a [`DensityField`].
//!
//! Every crossing edge gets exactly one vertex, looked up by the edge's global lattice
//! key, and is always interpolated from its lower corner to its upper one. Two cells
//! (or two chunks) that share an edge therefore compute bit-identical positions.

use std::time::Instant;

use strata_geom::Vec3;

use crate::config::NormalMode;
use crate::constants::{INTERP_EPS, SNAP_EPS};
use crate::density::DensityField;
use crate::mc_tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::mesh_build::MeshBuild;
use crate::scratch::with_scratch;

/// A lattice edge: its lower corner in global lattice units plus the axis it runs along.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub corner: [i32; 3],
    pub axis: u8,
}

/// Options shared by the isosurface meshers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoOptions {
    pub iso: f32,
    pub normals: NormalMode,
    pub snap: bool,
}

impl Default for IsoOptions {
    fn default() -> Self {
        Self {
            iso: 0.5,
            normals: NormalMode::Gradient,
            snap: true,
        }
    }
}

/// Interpolation parameter of the iso crossing from `vlo` to `vhi`.
///
/// Values within `INTERP_EPS` of the iso level snap to that endpoint; a flat edge
/// resolves to its lower end.
#[inline]
pub(crate) fn crossing_t(iso: f32, vlo: f32, vhi: f32) -> f32 {
    if (iso - vlo).abs() < INTERP_EPS {
        return 0.0;
    }
    if (iso - vhi).abs() < INTERP_EPS {
        return 1.0;
    }
    if (vlo - vhi).abs() < INTERP_EPS {
        return 0.0;
    }
    ((iso - vlo) / (vhi - vlo)).clamp(0.0, 1.0)
}

#[inline]
pub(crate) fn snap(p: Vec3) -> Vec3 {
    let s = |c: f32| (c / SNAP_EPS).round() * SNAP_EPS;
    Vec3::new(s(p.x), s(p.y), s(p.z))
}

/// Global lattice coordinate of a field index.
#[inline]
pub(crate) fn global_corner(field: &DensityField, p: [i32; 3]) -> [i32; 3] {
    let o = field.origin();
    let s = field.stride() as i32;
    [
        o[0].div_euclid(s) + p[0],
        o[1].div_euclid(s) + p[1],
        o[2].div_euclid(s) + p[2],
    ]
}

/// Crossing point on the lattice edge starting at `lo` along `axis`: local position and
/// the interpolation parameter.
#[inline]
pub(crate) fn edge_crossing(
    field: &DensityField,
    iso: f32,
    lo: [i32; 3],
    axis: usize,
) -> (Vec3, f32) {
    let mut hi = lo;
    hi[axis] += 1;
    let t = crossing_t(iso, field.get_arr(lo), field.get_arr(hi));
    (field.local_pos(lo).lerp(field.local_pos(hi), t), t)
}

/// Outward normal at a crossing: the negated field gradient, zero where it vanishes.
#[inline]
pub(crate) fn crossing_normal(field: &DensityField, lo: [i32; 3], axis: usize, t: f32) -> Vec3 {
    let mut hi = lo;
    hi[axis] += 1;
    (-field.gradient_on_edge(lo, hi, t)).normalized()
}

/// Triangulates cells `[0, n)^3` of `field` into `build`. Returns the triangle count.
///
/// Normals are written per vertex in `Gradient` mode; in `Faces` mode `build.norm` is
/// left empty for assembly to fill.
pub fn march_cubes(field: &DensityField, opts: IsoOptions, build: &mut MeshBuild) -> usize {
    let t0 = Instant::now();
    let n = field.n() as i32;
    let iso = opts.iso;
    let with_normals = opts.normals == NormalMode::Gradient;
    let mut tris = 0usize;

    with_scratch(|scratch| {
        let cache = &mut scratch.edge_cache;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let mut vals = [0f32; 8];
                    let mut case = 0usize;
                    for (k, off) in CORNER_OFFSETS.iter().enumerate() {
                        let v = field.get(x + off[0] as i32, y + off[1] as i32, z + off[2] as i32);
                        vals[k] = v;
                        if v > iso {
                            case |= 1 << k;
                        }
                    }
                    let edges = EDGE_TABLE[case];
                    if edges == 0 {
                        continue;
                    }

                    let mut verts = [u32::MAX; 12];
                    for (e, slot) in verts.iter_mut().enumerate() {
                        if edges & (1 << e) == 0 {
                            continue;
                        }
                        let [ca, cb] = EDGE_CORNERS[e];
                        let (oa, ob) = (CORNER_OFFSETS[ca], CORNER_OFFSETS[cb]);
                        let mut lo = [x, y, z];
                        let mut axis = 0usize;
                        for a in 0..3 {
                            lo[a] += oa[a].min(ob[a]) as i32;
                            if oa[a] != ob[a] {
                                axis = a;
                            }
                        }
                        let key = EdgeKey {
                            corner: global_corner(field, lo),
                            axis: axis as u8,
                        };
                        *slot = *cache.entry(key).or_insert_with(|| {
                            let (p, t) = edge_crossing(field, iso, lo, axis);
                            let p = if opts.snap { snap(p) } else { p };
                            let idx = build.push_position(p);
                            if with_normals {
                                let nrm = crossing_normal(field, lo, axis, t);
                                build.norm.extend_from_slice(&[nrm.x, nrm.y, nrm.z]);
                            }
                            idx
                        });
                    }

                    for tri in TRI_TABLE[case].chunks_exact(3) {
                        if tri[0] < 0 {
                            break;
                        }
                        let (a, b, c) = (
                            verts[tri[0] as usize],
                            verts[tri[2] as usize],
                            verts[tri[1] as usize],
                        );
                        let valid = a != u32::MAX && b != u32::MAX && c != u32::MAX;
                        debug_assert!(valid, "triangle table names an inactive edge (case {case})");
                        if !valid {
                            continue;
                        }
                        if build.push_triangle(a, b, c) {
                            tris += 1;
                        }
                    }
                }
            }
        }
    });

    log::debug!(
        target: "perf",
        "ms={:.2} mesher_mc n={} stride={} verts={} tris={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        n,
        field.stride(),
        build.vertex_count(),
        tris
    );
    tris
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_guards() {
        assert_eq!(crossing_t(0.5, 0.5, 1.0), 0.0);
        assert_eq!(crossing_t(0.5, 0.0, 0.5), 1.0);
        assert_eq!(crossing_t(0.5, 0.7, 0.7), 0.0);
        assert!((crossing_t(0.5, 0.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((crossing_t(0.0, -1.0, 3.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn single_inside_corner_faces_away_from_it() {
        // Only lattice corner (1,1,1) is inside; it is shared by eight cells.
        let field = DensityField::from_fn(2, 1, [0, 0, 0], |p| {
            if p == [1, 1, 1] { 1.0 } else { 0.0 }
        });
        let mut mb = MeshBuild::default();
        let tris = march_cubes(&field, IsoOptions::default(), &mut mb);
        assert_eq!(tris, 8);
        // Six crossing edges meet at the corner, each with one shared vertex.
        assert_eq!(mb.vertex_count(), 6);
        let center = Vec3::new(1.0, 1.0, 1.0);
        for t in mb.idx.chunks_exact(3) {
            let a = mb.position(t[0] as usize);
            let b = mb.position(t[1] as usize);
            let c = mb.position(t[2] as usize);
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid - center) > 0.0);
        }
        for i in 0..mb.vertex_count() {
            let n = mb.normal(i).unwrap_or(Vec3::ZERO);
            assert!(n.dot(mb.position(i) - center) > 0.0);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let field = DensityField::from_fn(6, 1, [12, 0, -6], |p| {
            let d = ((p[0] - 15).pow(2) + (p[1] - 3).pow(2) + (p[2] + 3).pow(2)) as f32;
            3.0 - d.sqrt()
        });
        let opts = IsoOptions { iso: 0.0, ..IsoOptions::default() };
        let mut a = MeshBuild::default();
        let mut b = MeshBuild::default();
        march_cubes(&field, opts, &mut a);
        march_cubes(&field, opts, &mut b);
        assert!(a.triangle_count() > 0);
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.idx, b.idx);
        assert_eq!(a.norm, b.norm);
    }
}
