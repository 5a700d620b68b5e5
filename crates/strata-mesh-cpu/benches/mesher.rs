use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkBuf, ChunkCoord};
use strata_mesh_cpu::{MeshOptions, MesherConfig, MesherKind, generate_chunk_mesh};

fn hills(x: i32, y: i32, z: i32) -> u8 {
    let h = 8.0 + 4.0 * ((x as f32) * 0.17).sin() * ((z as f32) * 0.13).cos();
    if (y as f32) < h { 2 } else { 0 }
}

fn bench_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_chunk_hills");
    let reg = BlockRegistry::builtin();
    let buf = ChunkBuf::from_sampler(ChunkCoord::new(0, 0, 0), 16, &hills);
    for kind in [
        MesherKind::Naive,
        MesherKind::Greedy,
        MesherKind::MarchingCubes,
        MesherKind::SurfaceNets,
    ] {
        let cfg = MesherConfig {
            kind,
            ..MesherConfig::default()
        };
        group.bench_function(format!("{kind:?}_16"), |b| {
            b.iter(|| {
                let out = generate_chunk_mesh(&buf, &hills, &reg, &MeshOptions::new(&cfg));
                black_box(out).ok();
            })
        });
    }
    group.finish();
}

fn bench_lod(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_chunk_lod");
    let reg = BlockRegistry::builtin();
    let buf = ChunkBuf::from_sampler(ChunkCoord::new(1, 0, 1), 16, &hills);
    for lod in 0..=2u8 {
        let cfg = MesherConfig {
            kind: MesherKind::MarchingCubes,
            lod,
            ..MesherConfig::default()
        };
        group.bench_function(format!("mc_lod{lod}"), |b| {
            b.iter(|| {
                let out = generate_chunk_mesh(&buf, &hills, &reg, &MeshOptions::new(&cfg));
                black_box(out).ok();
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_kinds, bench_lod
}
criterion_main!(benches);
