use std::f32::consts::PI;

use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkBuf, ChunkCoord, ChunkView};
use strata_geom::Vec3;
use strata_mesh_cpu::{
    DensityField, FieldKind, IsoOptions, MeshBuild, MeshOptions, MesherConfig, MesherKind,
    NormalMode, generate_chunk_mesh, march_cubes, sample_density, surface_nets, validate,
};

const N: usize = 16;

fn blob(x: i32, y: i32, z: i32) -> u8 {
    let (dx, dy, dz) = (x as f32 - 16.2, y as f32 - 7.6, z as f32 - 8.3);
    if dx * dx + dy * dy + dz * dz < 36.0 { 2 } else { 0 }
}

fn world_positions(mesh: &strata_mesh_cpu::ChunkMesh, origin: [i32; 3]) -> Vec<Vec3> {
    let o = Vec3::new(origin[0] as f32, origin[1] as f32, origin[2] as f32);
    mesh.positions.iter().map(|&p| Vec3::from_array(p) + o).collect()
}

fn all_matched(a: &[Vec3], b: &[Vec3], eps: f32) -> bool {
    a.iter().all(|p| b.iter().any(|q| p.distance(*q) < eps))
}

fn sphere_area_error(step: usize, r: f32) -> f32 {
    let n = 32 / step;
    let c = Vec3::new(16.3, 15.8, 16.1);
    let field = DensityField::from_fn(n, step, [0, 0, 0], |p| {
        r - Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32).distance(c)
    });
    let mut mb = MeshBuild::default();
    let opts = IsoOptions {
        iso: 0.0,
        ..IsoOptions::default()
    };
    march_cubes(&field, opts, &mut mb);
    let expected = 4.0 * PI * r * r;
    (mb.surface_area() - expected).abs() / expected
}

#[test]
fn marching_cubes_seam_vertices_coincide() {
    let reg = BlockRegistry::builtin();
    let cfg = MesherConfig {
        kind: MesherKind::MarchingCubes,
        ..MesherConfig::default()
    };
    let opts = MeshOptions::new(&cfg);
    let a = ChunkBuf::from_sampler(ChunkCoord::new(0, 0, 0), N, &blob);
    let b = ChunkBuf::from_sampler(ChunkCoord::new(1, 0, 0), N, &blob);
    let ma = generate_chunk_mesh(&a, &blob, &reg, &opts).unwrap();
    let mb = generate_chunk_mesh(&b, &blob, &reg, &opts).unwrap();
    let on_plane = |ps: Vec<Vec3>| -> Vec<Vec3> {
        ps.into_iter().filter(|p| (p.x - 16.0).abs() < 1e-4).collect()
    };
    let pa = on_plane(world_positions(&ma, a.origin()));
    let pb = on_plane(world_positions(&mb, b.origin()));
    assert!(!pa.is_empty());
    assert_eq!(pa.len(), pb.len());
    assert!(all_matched(&pa, &pb, 1e-4));
    assert!(all_matched(&pb, &pa, 1e-4));
}

#[test]
fn surface_nets_boundary_cells_agree_across_chunks() {
    let a = ChunkBuf::from_sampler(ChunkCoord::new(0, 0, 0), N, &blob);
    let b = ChunkBuf::from_sampler(ChunkCoord::new(1, 0, 0), N, &blob);
    let fa = sample_density(&ChunkView::new(&a, &blob), 1, FieldKind::Sdf, 2);
    let fb = sample_density(&ChunkView::new(&b, &blob), 1, FieldKind::Sdf, 2);
    let opts = IsoOptions {
        iso: 0.0,
        ..IsoOptions::default()
    };
    let mut ba = MeshBuild::default();
    let mut bb = MeshBuild::default();
    surface_nets(&fa, opts, &mut ba);
    surface_nets(&fb, opts, &mut bb);
    // Cell 15 of chunk A is cell -1 of chunk B: world x in (15, 16).
    let strip = |mb: &MeshBuild, ox: f32| -> Vec<Vec3> {
        (0..mb.vertex_count())
            .map(|i| mb.position(i) + Vec3::new(ox, 0.0, 0.0))
            .filter(|p| p.x > 15.0 && p.x < 16.0)
            .collect()
    };
    let sa = strip(&ba, 0.0);
    let sb = strip(&bb, 16.0);
    assert!(!sa.is_empty());
    assert_eq!(sa.len(), sb.len());
    assert!(all_matched(&sa, &sb, 1e-4));
}

#[test]
fn sphere_area_converges_with_smaller_steps() {
    let r = 10.0;
    let e1 = sphere_area_error(1, r);
    let e2 = sphere_area_error(2, r);
    let e4 = sphere_area_error(4, r);
    assert!(e1 < 0.03, "step 1 error {e1}");
    assert!(e4 < 0.15, "step 4 error {e4}");
    assert!(e1 <= e2 && e2 <= e4, "errors {e1} {e2} {e4}");
}

#[test]
fn binary_sphere_area_within_tolerance() {
    let r = 10.0f32;
    let c = Vec3::new(16.3, 15.8, 16.1);
    let field = DensityField::from_fn(32, 1, [0, 0, 0], |p| {
        let d = Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32).distance(c);
        if d < r { 1.0 } else { 0.0 }
    });
    let mut mb = MeshBuild::default();
    march_cubes(&field, IsoOptions::default(), &mut mb);
    let expected = 4.0 * PI * r * r;
    let err = (mb.surface_area() - expected).abs() / expected;
    assert!(err < 0.2, "binary sphere error {err}");
}

#[test]
fn single_voxel_marching_cubes_points_outward() {
    let reg = BlockRegistry::builtin();
    let cfg = MesherConfig {
        kind: MesherKind::MarchingCubes,
        ..MesherConfig::default()
    };
    let mut buf = ChunkBuf::new_cube(ChunkCoord::default(), N);
    buf.set_local(8, 8, 8, 2);
    let world = |_x: i32, _y: i32, _z: i32| 0u8;
    let mesh = generate_chunk_mesh(&buf, &world, &reg, &MeshOptions::new(&cfg)).unwrap();
    assert!(mesh.triangle_count() > 0);
    let center = Vec3::splat(8.0);
    let normals = mesh.normals.as_ref().unwrap();
    for (p, n) in mesh.positions.iter().zip(normals) {
        let d = Vec3::from_array(*p) - center;
        assert!(Vec3::from_array(*n).dot(d) > 0.0);
    }
    for [a, b, c] in mesh.triangles() {
        let pa = Vec3::from_array(mesh.positions[a as usize]);
        let pb = Vec3::from_array(mesh.positions[b as usize]);
        let pc = Vec3::from_array(mesh.positions[c as usize]);
        let n = (pb - pa).cross(pc - pa);
        assert!(n.dot((pa + pb + pc) / 3.0 - center) > 0.0);
    }
    assert!(validate(&mesh).is_ok());
}

#[test]
fn face_normals_match_gradient_direction() {
    let field = DensityField::from_fn(8, 1, [0, 0, 0], |p| {
        3.0 - Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32).distance(Vec3::splat(4.0))
    });
    let mut grad = MeshBuild::default();
    let mut faces = MeshBuild::default();
    let base = IsoOptions {
        iso: 0.0,
        ..IsoOptions::default()
    };
    march_cubes(&field, base, &mut grad);
    march_cubes(
        &field,
        IsoOptions {
            normals: NormalMode::Faces,
            ..base
        },
        &mut faces,
    );
    assert!(faces.norm.is_empty());
    strata_mesh_cpu::smooth_normals(&mut faces);
    for i in 0..grad.vertex_count() {
        let g = grad.normal(i).unwrap();
        let f = faces.normal(i).unwrap();
        assert!(g.dot(f) > 0.5);
    }
}
