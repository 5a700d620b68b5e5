use proptest::collection::vec;
use proptest::prelude::*;
use strata_blocks::{BlockDef, BlockId, BlockRegistry, BlockUvs};
use strata_chunk::{AirSampler, BlockSampler, ChunkBuf, ChunkCoord};
use strata_lighting::{LightGrid, MAX_LIGHT, compute_chunk_lightmap};

const SIZE: usize = 5;
const STONE: BlockId = 1;
const GLASS: BlockId = 2;
const LAMP: BlockId = 3;

fn registry() -> BlockRegistry {
    let mut reg = BlockRegistry::new(16);
    for (id, name, transparent, emission) in [
        (STONE, "stone", false, 0u8),
        (GLASS, "glass", true, 0),
        (LAMP, "lamp", false, 12),
    ] {
        reg.insert(BlockDef {
            id,
            name: name.into(),
            uvs: BlockUvs::uniform(0, 0),
            transparent,
            color: None,
            emission,
        });
    }
    reg
}

// Mostly air so lamps have room to spread.
fn cell() -> impl Strategy<Value = BlockId> {
    prop_oneof![6 => Just(0), 2 => Just(STONE), 1 => Just(GLASS), 1 => Just(LAMP)]
}

fn chunk(cells: &[BlockId]) -> ChunkBuf {
    let mut buf = ChunkBuf::new_cube(ChunkCoord::new(0, 0, 0), SIZE);
    for (i, id) in cells.iter().enumerate() {
        let (x, z, y) = (i % SIZE, (i / SIZE) % SIZE, i / (SIZE * SIZE));
        buf.set_local(x, y, z, *id);
    }
    buf
}

fn brightest_neighbor(lm: &LightGrid, x: usize, y: usize, z: usize) -> u8 {
    let (x, y, z) = (x as i32, y as i32, z as i32);
    let n = SIZE as i32;
    [[1, 0, 0], [-1, 0, 0], [0, 1, 0], [0, -1, 0], [0, 0, 1], [0, 0, -1]]
        .iter()
        .map(|d| [x + d[0], y + d[1], z + d[2]])
        .filter(|p| p.iter().all(|c| (0..n).contains(c)))
        .map(|p| lm.get(p[0] as usize, p[1] as usize, p[2] as usize))
        .max()
        .unwrap_or(0)
}

proptest! {
    // Sealed in stone: the only light is from lamps, and every lit cell is fed by a neighbor.
    #[test]
    fn sealed_light_is_one_below_brightest_neighbor(cells in vec(cell(), SIZE * SIZE * SIZE)) {
        let reg = registry();
        let buf = chunk(&cells);
        let world = |_x: i32, _y: i32, _z: i32| STONE;
        let lm = compute_chunk_lightmap(&buf, &world as &dyn BlockSampler, &reg);
        for y in 0..SIZE {
            for z in 0..SIZE {
                for x in 0..SIZE {
                    let level = lm.get(x, y, z);
                    prop_assert!(level <= MAX_LIGHT);
                    match buf.get_local(x, y, z) {
                        LAMP => prop_assert_eq!(level, 12),
                        STONE => prop_assert_eq!(level, 0),
                        _ => {
                            let n = brightest_neighbor(&lm, x, y, z);
                            prop_assert_eq!(level, n.saturating_sub(1), "cell {:?}", (x, y, z));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn open_columns_see_full_sky(cells in vec(cell(), SIZE * SIZE * SIZE)) {
        let reg = registry();
        let buf = chunk(&cells);
        let lm = compute_chunk_lightmap(&buf, &AirSampler, &reg);
        for z in 0..SIZE {
            for x in 0..SIZE {
                for y in (0..SIZE).rev() {
                    let id = buf.get_local(x, y, z);
                    if id == STONE || id == LAMP {
                        break;
                    }
                    prop_assert_eq!(lm.get(x, y, z), MAX_LIGHT);
                }
            }
        }
        prop_assert!(lm.levels.iter().all(|l| *l <= MAX_LIGHT));
    }
}
