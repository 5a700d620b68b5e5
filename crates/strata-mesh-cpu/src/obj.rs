//! Wavefront OBJ export for inspecting meshes in external tools.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::chunk::ChunkMesh;

/// Writes `mesh` as OBJ. Positions are offset by `origin` so several chunks can be
/// loaded side by side. Each submesh becomes a group.
pub fn write_obj(mesh: &ChunkMesh, origin: [i32; 3], out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "# chunk ({}, {}, {}) verts={} tris={}",
        mesh.coord.cx,
        mesh.coord.cy,
        mesh.coord.cz,
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;
    let o = origin.map(|c| c as f32);
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p[0] + o[0], p[1] + o[1], p[2] + o[2])?;
    }
    for uv in &mesh.uvs {
        writeln!(out, "vt {} {}", uv[0], uv[1])?;
    }
    let normals = mesh.normals.as_deref().unwrap_or(&[]);
    for n in normals {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    let has_normals = !normals.is_empty();
    for s in &mesh.submeshes {
        writeln!(out, "g {:?}", s.layer)?;
        for t in (s.index_start..s.index_start + s.index_count).step_by(3) {
            let f = [
                mesh.indices.get(t) + 1,
                mesh.indices.get(t + 1) + 1,
                mesh.indices.get(t + 2) + 1,
            ];
            if has_normals {
                writeln!(out, "f {0}/{0}/{0} {1}/{1}/{1} {2}/{2}/{2}", f[0], f[1], f[2])?;
            } else {
                writeln!(out, "f {0}/{0} {1}/{1} {2}/{2}", f[0], f[1], f[2])?;
            }
        }
    }
    Ok(())
}

pub fn save_obj(mesh: &ChunkMesh, origin: [i32; 3], path: impl AsRef<Path>) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_obj(mesh, origin, &mut w)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::mesh_build::MeshBuild;
    use strata_chunk::ChunkCoord;
    use strata_geom::Vec3;

    #[test]
    fn obj_lines_are_one_based() {
        let mut builds = [MeshBuild::default(), MeshBuild::default()];
        builds[0].add_quad_uv(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Vec3::new(0.0, 0.0, 1.0),
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        );
        let mesh = assemble(ChunkCoord::default(), &mut builds);
        let mut out = Vec::new();
        write_obj(&mesh, [16, 0, 0], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 4);
        assert!(text.contains("v 16 0 0"));
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3"));
        assert!(!text.contains(" 0/"));
    }
}
