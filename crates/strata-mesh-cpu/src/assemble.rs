//! Mesh assembly: per-layer builds into one [`ChunkMesh`], plus the clean-up passes
//! that run before it (normals, planar UVs, welding).

use hashbrown::HashMap;
use strata_chunk::ChunkCoord;
use strata_geom::{Aabb, Vec3};

use crate::chunk::{ChunkMesh, MeshIndices, Submesh, SurfaceLayer};
use crate::constants::{DEGENERATE_AREA2, U16_VERTEX_LIMIT};
use crate::mesh_build::MeshBuild;

/// Recomputes every normal as the area-weighted average of adjacent triangle normals.
pub fn smooth_normals(build: &mut MeshBuild) {
    build.norm.clear();
    build.norm.resize(build.pos.len(), 0.0);
    accumulate_face_normals(build, |_| true);
    normalize_in_place(&mut build.norm);
}

/// Replaces zero-length normals with the smooth face normal; fills all when absent.
pub(crate) fn fill_missing_normals(build: &mut MeshBuild) {
    if build.norm.len() != build.pos.len() {
        smooth_normals(build);
        return;
    }
    let missing: Vec<bool> = build
        .norm
        .chunks_exact(3)
        .map(|n| n[0] == 0.0 && n[1] == 0.0 && n[2] == 0.0)
        .collect();
    if !missing.iter().any(|&m| m) {
        return;
    }
    accumulate_face_normals(build, |v| missing[v]);
    normalize_in_place(&mut build.norm);
}

fn accumulate_face_normals(build: &mut MeshBuild, wants: impl Fn(usize) -> bool) {
    for t in 0..build.triangle_count() {
        let tri = [
            build.idx[t * 3] as usize,
            build.idx[t * 3 + 1] as usize,
            build.idx[t * 3 + 2] as usize,
        ];
        let a = build.position(tri[0]);
        let face = (build.position(tri[1]) - a).cross(build.position(tri[2]) - a);
        for v in tri {
            if wants(v) {
                build.norm[v * 3] += face.x;
                build.norm[v * 3 + 1] += face.y;
                build.norm[v * 3 + 2] += face.z;
            }
        }
    }
}

fn normalize_in_place(norm: &mut [f32]) {
    for n in norm.chunks_exact_mut(3) {
        let v = Vec3::new(n[0], n[1], n[2]).normalized();
        n.copy_from_slice(&v.to_array());
    }
}

/// World-anchored planar UVs chosen by the dominant normal axis:
/// `(x, z)` for Y, `(z, y)` for X, `(x, y)` for Z.
pub fn planar_uvs(build: &mut MeshBuild, origin: [i32; 3]) {
    let o = Vec3::new(origin[0] as f32, origin[1] as f32, origin[2] as f32);
    build.uv.clear();
    build.uv.reserve(build.vertex_count() * 2);
    for i in 0..build.vertex_count() {
        let p = build.position(i) + o;
        let n = build.normal(i).unwrap_or(Vec3::UP);
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        let uv = if ay >= ax && ay >= az {
            [p.x, p.z]
        } else if ax >= az {
            [p.z, p.y]
        } else {
            [p.x, p.y]
        };
        build.uv.extend_from_slice(&uv);
    }
}

/// Merges vertices that quantize to the same `eps` cell, then drops triangles that
/// collapse and vertices nothing references. Returns how many vertices were removed.
///
/// The first vertex in a cell keeps its attributes.
pub fn weld(build: &mut MeshBuild, eps: f32) -> usize {
    let before = build.vertex_count();
    if eps <= 0.0 || before == 0 {
        return 0;
    }
    let inv = 1.0 / eps;
    let mut first: HashMap<[i64; 3], u32> = HashMap::with_capacity(before);
    let mut remap: Vec<u32> = Vec::with_capacity(before);
    for i in 0..before {
        let p = build.position(i);
        let key = [
            (p.x * inv).round() as i64,
            (p.y * inv).round() as i64,
            (p.z * inv).round() as i64,
        ];
        remap.push(*first.entry(key).or_insert(i as u32));
    }

    let old_idx = std::mem::take(&mut build.idx);
    let mut used = vec![false; before];
    let mut kept: Vec<u32> = Vec::with_capacity(old_idx.len());
    for t in old_idx.chunks_exact(3) {
        let (a, b, c) = (remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]);
        if a == b || b == c || a == c {
            continue;
        }
        let pa = build.position(a as usize);
        let area2 = (build.position(b as usize) - pa)
            .cross(build.position(c as usize) - pa)
            .length_squared();
        if area2 <= DEGENERATE_AREA2 {
            continue;
        }
        for v in [a, b, c] {
            used[v as usize] = true;
        }
        kept.extend_from_slice(&[a, b, c]);
    }

    keep_used(build, &used, kept);
    before - build.vertex_count()
}

/// Drops vertices no triangle references. Returns how many were removed.
pub fn drop_unreferenced(build: &mut MeshBuild) -> usize {
    let before = build.vertex_count();
    let mut used = vec![false; before];
    for &v in &build.idx {
        used[v as usize] = true;
    }
    if used.iter().all(|&u| u) {
        return 0;
    }
    let idx = std::mem::take(&mut build.idx);
    keep_used(build, &used, idx);
    before - build.vertex_count()
}

/// Rebuilds `build` from the `used` vertices, renumbering `idx` to match.
fn keep_used(build: &mut MeshBuild, used: &[bool], idx: Vec<u32>) {
    let before = build.vertex_count();
    let mut new_index = vec![u32::MAX; before];
    let mut out = MeshBuild::default();
    let has_norm = build.norm.len() == build.pos.len();
    let has_uv = build.uv.len() == before * 2;
    let has_col = build.col.len() == before * 4;
    for (i, _) in used.iter().enumerate().filter(|(_, u)| **u) {
        new_index[i] = out.push_position(build.position(i));
        if has_norm {
            out.norm.extend_from_slice(&build.norm[i * 3..i * 3 + 3]);
        }
        if has_uv {
            out.uv.extend_from_slice(&build.uv[i * 2..i * 2 + 2]);
        }
        if has_col {
            out.col.extend_from_slice(&build.col[i * 4..i * 4 + 4]);
        }
    }
    out.idx = idx.into_iter().map(|v| new_index[v as usize]).collect();
    *build = out;
}

/// Checks the output invariants: whole triangles, indices in range, no repeated index,
/// no zero-area triangle, per-vertex attribute arrays the right length.
pub fn validate(mesh: &ChunkMesh) -> Result<(), String> {
    let verts = mesh.vertex_count();
    if mesh.indices.len() % 3 != 0 {
        return Err(format!("index count {} is not a multiple of 3", mesh.indices.len()));
    }
    if mesh.uvs.len() != verts {
        return Err(format!("{} uvs for {} vertices", mesh.uvs.len(), verts));
    }
    if let Some(n) = &mesh.normals {
        if n.len() != verts {
            return Err(format!("{} normals for {} vertices", n.len(), verts));
        }
    }
    if let Some(c) = &mesh.colors {
        if c.len() != verts {
            return Err(format!("{} colors for {} vertices", c.len(), verts));
        }
    }
    let expect_wide = verts > U16_VERTEX_LIMIT;
    if expect_wide && matches!(mesh.indices, MeshIndices::U16(_)) {
        return Err(format!("{verts} vertices with 16-bit indices"));
    }
    for (t, [a, b, c]) in mesh.triangles().enumerate() {
        if [a, b, c].iter().any(|&i| i as usize >= verts) {
            return Err(format!("triangle {t} indexes past {verts} vertices"));
        }
        if a == b || b == c || a == c {
            return Err(format!("triangle {t} repeats an index"));
        }
        let p = |i: u32| Vec3::from_array(mesh.positions[i as usize]);
        let area2 = (p(b) - p(a)).cross(p(c) - p(a)).length_squared();
        if area2 <= DEGENERATE_AREA2 {
            return Err(format!("triangle {t} has zero area"));
        }
    }
    for s in &mesh.submeshes {
        if s.index_start + s.index_count > mesh.indices.len()
            || s.vertex_start + s.vertex_count > verts
        {
            return Err(format!("submesh {:?} out of range", s.layer));
        }
    }
    Ok(())
}

/// Concatenates the non-empty layers into one mesh with a submesh range per layer.
///
/// Missing normals are computed from the faces. Colors are kept only when every
/// layer has them. Indices widen to 32 bits past 65535 vertices.
pub fn assemble(coord: ChunkCoord, builds: &mut [MeshBuild; 2]) -> ChunkMesh {
    let total_verts: usize = builds
        .iter()
        .filter(|b| !b.is_empty())
        .map(MeshBuild::vertex_count)
        .sum();
    let total_idx: usize = builds.iter().map(|b| b.idx.len()).sum();
    let mut mesh = ChunkMesh::empty(coord);
    mesh.positions.reserve(total_verts);
    mesh.uvs.reserve(total_verts);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(total_verts);
    let mut colors: Vec<[u8; 4]> = Vec::with_capacity(total_verts);
    let mut all_colored = true;
    let mut indices: Vec<u32> = Vec::with_capacity(total_idx);

    for layer in SurfaceLayer::ALL {
        let build = &mut builds[layer.index()];
        if build.is_empty() {
            continue;
        }
        fill_missing_normals(build);
        let base = mesh.positions.len();
        let index_start = indices.len();
        let verts = build.vertex_count();
        for i in 0..verts {
            mesh.positions.push(build.position(i).to_array());
            normals.push([build.norm[i * 3], build.norm[i * 3 + 1], build.norm[i * 3 + 2]]);
            if build.uv.len() == verts * 2 {
                mesh.uvs.push([build.uv[i * 2], build.uv[i * 2 + 1]]);
            } else {
                mesh.uvs.push([0.0, 0.0]);
            }
        }
        if build.col.len() == verts * 4 {
            colors.extend(
                build
                    .col
                    .chunks_exact(4)
                    .map(|c| [c[0], c[1], c[2], c[3]]),
            );
        } else {
            all_colored = false;
        }
        indices.extend(build.idx.iter().map(|&i| i + base as u32));
        mesh.submeshes.push(Submesh {
            layer,
            index_start,
            index_count: build.idx.len(),
            vertex_start: base,
            vertex_count: verts,
        });
    }

    if !mesh.positions.is_empty() {
        mesh.normals = Some(normals);
        if all_colored {
            mesh.colors = Some(colors);
        }
    }
    mesh.indices = if mesh.positions.len() > U16_VERTEX_LIMIT {
        MeshIndices::U32(indices)
    } else {
        MeshIndices::U16(indices.into_iter().map(|i| i as u16).collect())
    };
    mesh.bounds = Aabb::from_points(mesh.positions.iter().map(|&p| Vec3::from_array(p)))
        .unwrap_or_default();

    #[cfg(feature = "mesh_checks")]
    debug_assert!(
        validate(&mesh).is_ok(),
        "assembled mesh is invalid: {:?}",
        validate(&mesh)
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::IndexWidth;

    fn quad(mb: &mut MeshBuild, y: f32) {
        let n = Vec3::UP;
        let c = [
            Vec3::new(0.0, y, 0.0),
            Vec3::new(1.0, y, 0.0),
            Vec3::new(1.0, y, 1.0),
            Vec3::new(0.0, y, 1.0),
        ];
        mb.add_quad_uv(c, n, [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn layers_become_submeshes_with_offsets() {
        let mut builds = [MeshBuild::default(), MeshBuild::default()];
        quad(&mut builds[0], 0.0);
        quad(&mut builds[1], 1.0);
        quad(&mut builds[1], 2.0);
        let mesh = assemble(ChunkCoord::default(), &mut builds);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.indices.width(), IndexWidth::U16);
        let t = mesh.submesh(SurfaceLayer::Transparent).copied().unwrap();
        assert_eq!((t.index_start, t.index_count, t.vertex_start), (6, 12, 4));
        assert!(mesh.indices.iter().skip(6).all(|i| i >= 4));
        assert!(mesh.colors.is_none());
        assert_eq!(mesh.bounds.max.y, 2.0);
        assert!(validate(&mesh).is_ok());
    }

    #[test]
    fn empty_builds_assemble_to_empty_mesh() {
        let mut builds = [MeshBuild::default(), MeshBuild::default()];
        let mesh = assemble(ChunkCoord::new(1, 2, 3), &mut builds);
        assert!(mesh.is_empty());
        assert!(mesh.submeshes.is_empty());
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.bounds, Aabb::default());
    }

    #[test]
    fn weld_merges_split_vertices_and_drops_collapsed() {
        let mut mb = MeshBuild::default();
        let a = mb.push_position(Vec3::new(0.0, 0.0, 0.0));
        let b = mb.push_position(Vec3::new(1.0, 0.0, 0.0));
        let c = mb.push_position(Vec3::new(0.0, 1.0, 0.0));
        let b2 = mb.push_position(Vec3::new(1.0, 0.00001, 0.0));
        let d = mb.push_position(Vec3::new(1.0, 1.0, 0.0));
        let sliver = mb.push_position(Vec3::new(1.00002, 0.0, 0.0));
        assert!(mb.push_triangle(a, b, c));
        assert!(mb.push_triangle(c, b2, d));
        assert!(mb.push_triangle(b, sliver, d));
        let removed = weld(&mut mb, 1e-4);
        assert_eq!(removed, 2);
        assert_eq!(mb.vertex_count(), 4);
        assert_eq!(mb.triangle_count(), 2);
        assert_eq!(mb.idx[4], 1);
    }

    #[test]
    fn unreferenced_vertices_are_dropped_without_welding() {
        let mut mb = MeshBuild::default();
        mb.push_position(Vec3::new(-5.0, -5.0, -5.0));
        mb.norm.extend_from_slice(&[1.0, 0.0, 0.0]);
        mb.uv.extend_from_slice(&[9.0, 9.0]);
        quad(&mut mb, 1.0);
        assert_eq!(drop_unreferenced(&mut mb), 1);
        assert_eq!(mb.vertex_count(), 4);
        assert_eq!(mb.norm.len(), 12);
        assert_eq!(mb.uv.len(), 8);
        assert_eq!(mb.normal(0), Some(Vec3::UP));
        assert!(mb.idx.iter().all(|&i| i < 4));
        assert_eq!(drop_unreferenced(&mut mb), 0);

        let mut builds = [mb, MeshBuild::default()];
        let mesh = assemble(ChunkCoord::default(), &mut builds);
        assert_eq!(mesh.bounds.min, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn smooth_normals_follow_winding() {
        let mut mb = MeshBuild::default();
        quad(&mut mb, 0.0);
        mb.norm.clear();
        smooth_normals(&mut mb);
        for i in 0..4 {
            assert_eq!(mb.normal(i), Some(Vec3::UP));
        }
    }

    #[test]
    fn planar_uvs_pick_dominant_axis() {
        let mut mb = MeshBuild::default();
        mb.push_position(Vec3::new(1.0, 2.0, 3.0));
        mb.norm.extend_from_slice(&[0.9, 0.1, 0.0]);
        planar_uvs(&mut mb, [16, 0, 0]);
        assert_eq!(mb.uv, vec![3.0, 2.0]);
    }
}
