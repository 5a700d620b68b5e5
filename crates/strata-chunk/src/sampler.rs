use strata_blocks::{AIR, BlockId};

use crate::{ChunkBuf, ChunkCoord};

/// World-space block lookup.
///
/// Must be side-effect free and total: ungenerated or out-of-range cells read as air.
pub trait BlockSampler {
    fn sample_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId;
}

impl<F> BlockSampler for F
where
    F: Fn(i32, i32, i32) -> BlockId,
{
    #[inline]
    fn sample_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        self(wx, wy, wz)
    }
}

/// A sampler that only ever returns air.
#[derive(Copy, Clone, Debug, Default)]
pub struct AirSampler;

impl BlockSampler for AirSampler {
    #[inline]
    fn sample_block(&self, _wx: i32, _wy: i32, _wz: i32) -> BlockId {
        AIR
    }
}

/// Block lookup plus a chunk-existence test, injected into anything that needs world access.
pub trait WorldView: BlockSampler {
    fn chunk_loaded(&self, coord: ChunkCoord) -> bool;
    fn chunk_size(&self) -> usize;
}

/// A chunk snapshot with a fallback sampler for cells outside it.
#[derive(Copy, Clone)]
pub struct ChunkView<'a> {
    pub buf: &'a ChunkBuf,
    pub world: &'a dyn BlockSampler,
}

impl<'a> ChunkView<'a> {
    pub fn new(buf: &'a ChunkBuf, world: &'a dyn BlockSampler) -> Self {
        Self { buf, world }
    }

    /// Lookup by chunk-local signed coordinates.
    #[inline]
    pub fn get_rel(&self, x: i32, y: i32, z: i32) -> BlockId {
        match self.buf.get_local_i(x, y, z) {
            Some(id) => id,
            None => {
                let [ox, oy, oz] = self.buf.origin();
                self.world.sample_block(ox + x, oy + y, oz + z)
            }
        }
    }
}

impl BlockSampler for ChunkView<'_> {
    #[inline]
    fn sample_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        match self.buf.get_world(wx, wy, wz) {
            Some(id) => id,
            None => self.world.sample_block(wx, wy, wz),
        }
    }
}
