use crate::types::{BlockId, BlockUvs, FaceKind, TileCoord};

/// Normalized UV rectangle of one atlas tile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Dense `BlockId -> BlockUvs` table over a square atlas of `tiles_per_side` tiles.
///
/// Every id resolves: entries that were never set hold [`BlockUvs::FALLBACK`].
#[derive(Clone, Debug)]
pub struct AtlasUvTable {
    tiles_per_side: u16,
    entries: Box<[BlockUvs; 256]>,
}

impl Default for AtlasUvTable {
    fn default() -> Self {
        Self::new(16)
    }
}

impl AtlasUvTable {
    pub fn new(tiles_per_side: u16) -> Self {
        Self {
            tiles_per_side: tiles_per_side.max(1),
            entries: Box::new([BlockUvs::FALLBACK; 256]),
        }
    }

    #[inline]
    pub fn tiles_per_side(&self) -> u16 {
        self.tiles_per_side
    }

    pub fn set(&mut self, id: BlockId, uvs: BlockUvs) {
        self.entries[id as usize] = uvs;
    }

    /// Air always maps to the fallback tiles.
    #[inline]
    pub fn lookup(&self, id: BlockId) -> BlockUvs {
        if id == 0 {
            BlockUvs::FALLBACK
        } else {
            self.entries[id as usize]
        }
    }

    #[inline]
    pub fn tile(&self, id: BlockId, kind: FaceKind) -> TileCoord {
        self.lookup(id).tile(kind)
    }

    /// `[tx/n, ty/n] .. [(tx+1)/n, (ty+1)/n]`; out-of-atlas tiles clamp to the last row/column.
    pub fn uv_rect(&self, tile: TileCoord) -> UvRect {
        let n = self.tiles_per_side as f32;
        let last = self.tiles_per_side.saturating_sub(1);
        let tx = (tile.x as u16).min(last) as f32;
        let ty = (tile.y as u16).min(last) as f32;
        UvRect {
            min: [tx / n, ty / n],
            max: [(tx + 1.0) / n, (ty + 1.0) / n],
        }
    }

    #[inline]
    pub fn face_rect(&self, id: BlockId, kind: FaceKind) -> UvRect {
        self.uv_rect(self.tile(id, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_and_unknown_use_fallback() {
        let mut t = AtlasUvTable::default();
        t.set(0, BlockUvs::uniform(9, 9));
        assert_eq!(t.lookup(0), BlockUvs::FALLBACK);
        assert_eq!(t.lookup(200), BlockUvs::FALLBACK);
    }

    #[test]
    fn uv_rect_matches_tile_grid() {
        let t = AtlasUvTable::default();
        let r = t.uv_rect(TileCoord::new(3, 15));
        assert_eq!(r.min, [3.0 / 16.0, 15.0 / 16.0]);
        assert_eq!(r.max, [4.0 / 16.0, 1.0]);
    }

    #[test]
    fn uv_rect_clamps_outside_atlas() {
        let t = AtlasUvTable::new(4);
        let r = t.uv_rect(TileCoord::new(10, 2));
        assert_eq!(r.min, [0.75, 0.5]);
        assert_eq!(r.max, [1.0, 0.75]);
    }
}
