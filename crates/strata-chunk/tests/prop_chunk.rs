use proptest::prelude::*;
use strata_chunk::io::{chunk_from_csv, chunk_to_csv};
use strata_chunk::{BlockSampler, ChunkBuf, ChunkCoord, ChunkMap};

fn dim() -> impl Strategy<Value = usize> {
    1usize..=8
}

fn small_i32() -> impl Strategy<Value = i32> {
    -1_000i32..=1_000
}

proptest! {
    // idx maps each (x,y,z) within bounds to unique in-range indices
    #[test]
    fn idx_is_unique_and_in_range(sx in dim(), sy in dim(), sz in dim()) {
        let expect = sx * sy * sz;
        let buf = ChunkBuf::new_air(ChunkCoord::default(), sx, sy, sz);
        let mut seen = vec![false; expect];
        for y in 0..sy { for z in 0..sz { for x in 0..sx {
            let i = buf.idx(x, y, z);
            prop_assert!(i < expect);
            prop_assert!(!seen[i]);
            seen[i] = true;
        }}}
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // contains_world and get_world agree for cells around the chunk
    #[test]
    fn contains_world_and_get_world_agree(
        cx in small_i32(), cy in small_i32(), cz in small_i32(),
        sx in dim(), sy in dim(), sz in dim(),
        dx in -2i32..10, dy in -2i32..10, dz in -2i32..10,
    ) {
        let n = sx * sy * sz;
        let blocks = (0..n).map(|i| (i % 251) as u8).collect();
        let buf = ChunkBuf::from_blocks(ChunkCoord::new(cx, cy, cz), sx, sy, sz, blocks).unwrap();
        let [ox, oy, oz] = buf.origin();
        let (wx, wy, wz) = (ox + dx, oy + dy, oz + dz);
        let inside = buf.contains_world(wx, wy, wz);
        prop_assert_eq!(inside, buf.get_world(wx, wy, wz).is_some());
        if inside {
            let v = buf.get_world(wx, wy, wz).unwrap();
            prop_assert_eq!(v, buf.get_local(dx as usize, dy as usize, dz as usize));
        }
    }

    #[test]
    fn csv_preserves_blocks(sx in dim(), sy in dim(), sz in dim(), seed in any::<u32>()) {
        let n = sx * sy * sz;
        let blocks = (0..n).map(|i| (seed.wrapping_mul(i as u32 + 7) >> 24) as u8).collect();
        let buf = ChunkBuf::from_blocks(ChunkCoord::default(), sx, sy, sz, blocks).unwrap();
        let text = chunk_to_csv(&buf);
        let back = chunk_from_csv(ChunkCoord::default(), sx, sy, sz, &text).unwrap();
        prop_assert_eq!(back, buf);
    }

    // map sampling agrees with direct edits for arbitrary world cells
    #[test]
    fn map_set_then_sample(wx in -12i32..12, wy in -12i32..12, wz in -12i32..12, id in 1u8..=255) {
        let mut m = ChunkMap::new(4);
        for cx in -3..3 { for cy in -3..3 { for cz in -3..3 {
            m.insert(ChunkBuf::new_cube(ChunkCoord::new(cx, cy, cz), 4)).unwrap();
        }}}
        let dirty = m.set_block(wx, wy, wz, id);
        prop_assert_eq!(dirty[0], ChunkCoord::containing(wx, wy, wz, 4));
        prop_assert!(dirty.len() <= 7);
        prop_assert_eq!(m.sample_block(wx, wy, wz), id);
    }

    // a reach-limited edit dirties exactly the chunks whose grown box holds the cell
    #[test]
    fn reach_dirty_set_is_exact(
        wx in -8i32..8, wy in -8i32..8, wz in -8i32..8, reach in 0usize..6,
    ) {
        let mut m = ChunkMap::new(4);
        for cx in -3..3 { for cy in -3..3 { for cz in -3..3 {
            m.insert(ChunkBuf::new_cube(ChunkCoord::new(cx, cy, cz), 4)).unwrap();
        }}}
        let dirty = m.set_block_within(wx, wy, wz, 7, reach);
        prop_assert_eq!(dirty[0], ChunkCoord::containing(wx, wy, wz, 4));
        let r = reach as i32;
        let near = |c: ChunkCoord| {
            let within = |w: i32, c: i32| w >= c * 4 - r && w < (c + 1) * 4 + r;
            within(wx, c.cx) && within(wy, c.cy) && within(wz, c.cz)
        };
        for c in m.coords() {
            prop_assert_eq!(dirty.contains(&c), near(c));
        }
    }
}
