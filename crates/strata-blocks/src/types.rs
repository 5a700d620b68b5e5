/// Block identifier; `0` is air.
pub type BlockId = u8;

pub const AIR: BlockId = 0;

/// Which of the three per-block tiles a face samples.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaceKind {
    Top,
    Bottom,
    Side,
}

impl FaceKind {
    /// Face kind for an axis-aligned normal: +Y is `Top`, -Y is `Bottom`, the rest `Side`.
    #[inline]
    pub fn from_axis_sign(axis: usize, positive: bool) -> FaceKind {
        match (axis, positive) {
            (1, true) => FaceKind::Top,
            (1, false) => FaceKind::Bottom,
            _ => FaceKind::Side,
        }
    }
}

/// Integer tile coordinate inside the atlas.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TileCoord {
    pub x: u8,
    pub y: u8,
}

impl TileCoord {
    #[inline]
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// Top / side / bottom tiles of one block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockUvs {
    pub top: TileCoord,
    pub side: TileCoord,
    pub bottom: TileCoord,
}

impl BlockUvs {
    pub const fn new(top: TileCoord, side: TileCoord, bottom: TileCoord) -> Self {
        Self { top, side, bottom }
    }

    /// One tile on every face.
    pub const fn uniform(x: u8, y: u8) -> Self {
        let t = TileCoord::new(x, y);
        Self::new(t, t, t)
    }

    /// Distinct top and side tiles; the bottom repeats the top.
    pub const fn top_side(tx: u8, ty: u8, sx: u8, sy: u8) -> Self {
        let top = TileCoord::new(tx, ty);
        Self::new(top, TileCoord::new(sx, sy), top)
    }

    /// Grass-style tiles used for air and unknown ids.
    pub const FALLBACK: BlockUvs = BlockUvs::new(
        TileCoord::new(0, 15),
        TileCoord::new(3, 15),
        TileCoord::new(2, 15),
    );

    #[inline]
    pub fn tile(&self, kind: FaceKind) -> TileCoord {
        match kind {
            FaceKind::Top => self.top,
            FaceKind::Bottom => self.bottom,
            FaceKind::Side => self.side,
        }
    }
}

impl Default for BlockUvs {
    fn default() -> Self {
        BlockUvs::FALLBACK
    }
}
