//! Chunk storage, block sampling capabilities, and the in-memory chunk map.
#![forbid(unsafe_code)]

pub mod coord;
pub mod error;
pub mod io;
pub mod map;
pub mod sampler;
pub mod window;

pub use coord::ChunkCoord;
pub use error::ChunkError;
pub use map::ChunkMap;
pub use sampler::{AirSampler, BlockSampler, ChunkView, WorldView};
pub use window::BlockWindow;

use strata_blocks::{AIR, BlockId};

/// Default chunk edge length.
pub const CHUNK_SIZE: usize = 16;

/// Dense grid of block ids for one chunk, stored y-major: `(y * sz + z) * sx + x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBuf {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub blocks: Vec<BlockId>,
}

impl ChunkBuf {
    /// All-air chunk.
    pub fn new_air(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Self {
        ChunkBuf {
            coord,
            sx,
            sy,
            sz,
            blocks: vec![AIR; sx * sy * sz],
        }
    }

    /// Cubic all-air chunk of edge `size`.
    pub fn new_cube(coord: ChunkCoord, size: usize) -> Self {
        Self::new_air(coord, size, size, size)
    }

    /// Wraps an existing block array. The length must be exactly `sx * sy * sz`.
    pub fn from_blocks(
        coord: ChunkCoord,
        sx: usize,
        sy: usize,
        sz: usize,
        blocks: Vec<BlockId>,
    ) -> Result<Self, ChunkError> {
        if sx == 0 || sy == 0 || sz == 0 {
            return Err(ChunkError::InvalidSize(sx.min(sy).min(sz)));
        }
        let expected = sx * sy * sz;
        if blocks.len() != expected {
            return Err(ChunkError::ShapeMismatch {
                expected,
                got: blocks.len(),
            });
        }
        Ok(ChunkBuf {
            coord,
            sx,
            sy,
            sz,
            blocks,
        })
    }

    /// Fills a cubic chunk from a world-space sampler.
    pub fn from_sampler(coord: ChunkCoord, size: usize, sampler: &dyn BlockSampler) -> Self {
        let mut buf = Self::new_cube(coord, size);
        let [ox, oy, oz] = buf.origin();
        for y in 0..size {
            for z in 0..size {
                for x in 0..size {
                    let i = buf.idx(x, y, z);
                    buf.blocks[i] =
                        sampler.sample_block(ox + x as i32, oy + y as i32, oz + z as i32);
                }
            }
        }
        buf
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        [self.sx, self.sy, self.sz]
    }

    /// World coordinate of local `(0,0,0)`.
    #[inline]
    pub fn origin(&self) -> [i32; 3] {
        [
            self.coord.cx * self.sx as i32,
            self.coord.cy * self.sy as i32,
            self.coord.cz * self.sz as i32,
        ]
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        let i = self.idx(x, y, z);
        self.blocks[i] = id;
    }

    /// Signed local lookup; `None` outside the grid.
    #[inline]
    pub fn get_local_i(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.sx || y >= self.sy || z >= self.sz {
            return None;
        }
        Some(self.get_local(x, y, z))
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let [bx, by, bz] = self.origin();
        wx >= bx
            && wx < bx + self.sx as i32
            && wy >= by
            && wy < by + self.sy as i32
            && wz >= bz
            && wz < bz + self.sz as i32
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<BlockId> {
        let [bx, by, bz] = self.origin();
        self.get_local_i(wx - bx, wy - by, wz - bz)
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| *b != AIR)
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        !self.has_non_air()
    }

    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| **b != AIR).count()
    }
}
