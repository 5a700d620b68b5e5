use strata_blocks::{AIR, BlockId};

use crate::sampler::BlockSampler;

/// Dense snapshot of a world-space box `[min, min + dims)`.
///
/// Neighborhood queries near a chunk hit the same cells many times; capturing them
/// once keeps the sampler off the hot path. Reads outside the box return air.
#[derive(Clone, Debug, Default)]
pub struct BlockWindow {
    min: [i32; 3],
    dims: [usize; 3],
    cells: Vec<BlockId>,
}

impl BlockWindow {
    pub fn capture(sampler: &dyn BlockSampler, min: [i32; 3], dims: [usize; 3]) -> Self {
        Self::capture_into(sampler, min, dims, Vec::new())
    }

    /// Like [`BlockWindow::capture`], reusing `storage` for the cells.
    pub fn capture_into(
        sampler: &dyn BlockSampler,
        min: [i32; 3],
        dims: [usize; 3],
        mut storage: Vec<BlockId>,
    ) -> Self {
        storage.clear();
        storage.reserve(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    storage.push(sampler.sample_block(
                        min[0] + x as i32,
                        min[1] + y as i32,
                        min[2] + z as i32,
                    ));
                }
            }
        }
        Self {
            min,
            dims,
            cells: storage,
        }
    }

    #[inline]
    pub fn min(&self) -> [i32; 3] {
        self.min
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn get(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        let lx = wx - self.min[0];
        let ly = wy - self.min[1];
        let lz = wz - self.min[2];
        if lx < 0 || ly < 0 || lz < 0 {
            return AIR;
        }
        let (lx, ly, lz) = (lx as usize, ly as usize, lz as usize);
        if lx >= self.dims[0] || ly >= self.dims[1] || lz >= self.dims[2] {
            return AIR;
        }
        self.cells[(lz * self.dims[1] + ly) * self.dims[0] + lx]
    }

    /// Returns the cell storage for reuse.
    pub fn into_storage(self) -> Vec<BlockId> {
        self.cells
    }
}

impl BlockSampler for BlockWindow {
    #[inline]
    fn sample_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        self.get(wx, wy, wz)
    }
}
