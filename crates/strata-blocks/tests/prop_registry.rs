use proptest::prelude::*;
use strata_blocks::{AtlasUvTable, BlockRegistry, FaceKind, TileCoord, TransparencySet};

fn arb_face() -> impl Strategy<Value = FaceKind> {
    prop_oneof![
        Just(FaceKind::Top),
        Just(FaceKind::Bottom),
        Just(FaceKind::Side)
    ]
}

proptest! {
    #[test]
    fn every_id_resolves_to_rect_inside_atlas(id in any::<u8>(), face in arb_face()) {
        let reg = BlockRegistry::builtin();
        let r = reg.atlas.face_rect(id, face);
        prop_assert!(r.min[0] >= 0.0 && r.min[1] >= 0.0);
        prop_assert!(r.max[0] <= 1.0 && r.max[1] <= 1.0);
        prop_assert!((r.max[0] - r.min[0] - 1.0 / 16.0).abs() < 1e-6);
        prop_assert!((r.max[1] - r.min[1] - 1.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn uv_rect_is_tile_over_count(x in 0u8..16, y in 0u8..16) {
        let t = AtlasUvTable::new(16);
        let r = t.uv_rect(TileCoord::new(x, y));
        prop_assert_eq!(r.min, [x as f32 / 16.0, y as f32 / 16.0]);
        prop_assert_eq!(r.max, [(x as f32 + 1.0) / 16.0, (y as f32 + 1.0) / 16.0]);
    }

    #[test]
    fn transparency_set_matches_vec_model(ids in prop::collection::vec(any::<u8>(), 0..64)) {
        let set: TransparencySet = ids.iter().copied().collect();
        for id in 0..=255u8 {
            let expected = id != 0 && ids.contains(&id);
            prop_assert_eq!(set.contains(id), expected);
        }
    }
}
