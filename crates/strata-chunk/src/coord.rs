/// Integer chunk coordinate; chunk `c` covers world cells `[c * size, (c + 1) * size)` per axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// Chunk holding world cell `(wx, wy, wz)` for cubic chunks of edge `size`.
    #[inline]
    pub fn containing(wx: i32, wy: i32, wz: i32, size: usize) -> Self {
        let s = size as i32;
        Self {
            cx: wx.div_euclid(s),
            cy: wy.div_euclid(s),
            cz: wz.div_euclid(s),
        }
    }

    /// The six face-adjacent coordinates: +X, -X, +Y, -Y, +Z, -Z.
    pub fn face_neighbors(self) -> [ChunkCoord; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_floors_negative_coords() {
        assert_eq!(ChunkCoord::containing(-1, 0, 15, 16), ChunkCoord::new(-1, 0, 0));
        assert_eq!(ChunkCoord::containing(-16, -17, 16, 16), ChunkCoord::new(-1, -2, 1));
    }
}
