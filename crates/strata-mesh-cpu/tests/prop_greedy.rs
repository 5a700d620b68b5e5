use proptest::prelude::*;
use strata_blocks::{AtlasUvTable, BlockId, TransparencySet};
use strata_chunk::{ChunkBuf, ChunkCoord, ChunkView};
use strata_mesh_cpu::{LayerMode, MeshBuild, VoxelGrid, mesh_greedy, mesh_naive};

const N: usize = 5;

fn area_by_face(mb: &MeshBuild) -> [f32; 6] {
    let mut out = [0f32; 6];
    for q in 0..mb.vertex_count() / 4 {
        let Some(n) = mb.normal(q * 4) else { continue };
        let axis = if n.x != 0.0 { 0 } else if n.y != 0.0 { 1 } else { 2 };
        let p0 = mb.position(q * 4);
        let a = (mb.position(q * 4 + 1) - p0)
            .cross(mb.position(q * 4 + 3) - p0)
            .length();
        out[axis * 2 + usize::from(n.axis(axis) > 0.0)] += a;
    }
    out
}

fn hash_block(seed: u32, x: i32, y: i32, z: i32) -> BlockId {
    let mut h = seed ^ (x as u32).wrapping_mul(73856093);
    h ^= (y as u32).wrapping_mul(19349663);
    h ^= (z as u32).wrapping_mul(83492791);
    h = h.wrapping_mul(2654435761);
    match (h >> 28) & 7 {
        0..=3 => 0,
        4 | 5 => 2,
        6 => 3,
        _ => 10,
    }
}

fn cells() -> impl Strategy<Value = Vec<BlockId>> {
    let cell = prop_oneof![4 => Just(0u8), 2 => Just(2u8), 1 => Just(3u8), 1 => Just(10u8)];
    prop::collection::vec(cell, N * N * N)
}

fn meshes(
    blocks: Vec<BlockId>,
    seed: u32,
    mode: LayerMode,
    padding: usize,
) -> ([MeshBuild; 2], [MeshBuild; 2]) {
    let buf = ChunkBuf::from_blocks(ChunkCoord::new(1, 0, -1), N, N, N, blocks).unwrap();
    let world = move |x: i32, y: i32, z: i32| hash_block(seed, x, y, z);
    let grid = VoxelGrid::from_view(&ChunkView::new(&buf, &world));
    let atlas = AtlasUvTable::default();
    let mut naive = [MeshBuild::default(), MeshBuild::default()];
    let mut greedy = [MeshBuild::default(), MeshBuild::default()];
    mesh_naive(&grid, &atlas, mode, &mut naive);
    mesh_greedy(&grid, &atlas, mode, padding, &mut greedy);
    (naive, greedy)
}

proptest! {
    // Greedy merging never changes the covered area of any face direction.
    #[test]
    fn greedy_area_matches_naive(blocks in cells(), seed in any::<u32>(), padding in 0usize..3) {
        let (naive, greedy) = meshes(blocks, seed, LayerMode::Single, padding);
        prop_assert_eq!(area_by_face(&naive[0]), area_by_face(&greedy[0]));
        prop_assert!(greedy[0].vertex_count() <= naive[0].vertex_count() || padding > 0);
    }

    // Same per layer when transparent ids get their own pass.
    #[test]
    fn split_layers_match_naive(blocks in cells(), seed in any::<u32>()) {
        let t: TransparencySet = [10u8].into_iter().collect();
        let (naive, greedy) = meshes(blocks, seed, LayerMode::new(true, t), 0);
        for layer in 0..2 {
            prop_assert_eq!(area_by_face(&naive[layer]), area_by_face(&greedy[layer]));
        }
    }

    // Every emitted triangle is non-degenerate and indexes a real vertex.
    #[test]
    fn greedy_triangles_are_valid(blocks in cells(), seed in any::<u32>()) {
        let (_, greedy) = meshes(blocks, seed, LayerMode::Single, 1);
        let mb = &greedy[0];
        prop_assert_eq!(mb.idx.len() % 3, 0);
        for t in mb.idx.chunks_exact(3) {
            prop_assert!(t.iter().all(|&i| (i as usize) < mb.vertex_count()));
            let a = mb.position(t[0] as usize);
            let n = (mb.position(t[1] as usize) - a).cross(mb.position(t[2] as usize) - a);
            prop_assert!(n.length_squared() > 0.0);
        }
    }
}
