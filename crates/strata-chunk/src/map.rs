use hashbrown::HashMap;
use strata_blocks::{AIR, BlockId};

use crate::sampler::{BlockSampler, ChunkView, WorldView};
use crate::{ChunkBuf, ChunkCoord, ChunkError};

/// In-memory world of cubic chunks.
///
/// Unloaded chunks read as air, so a mesher running against a partially loaded
/// map draws boundary faces until the neighbor arrives and both are re-meshed.
#[derive(Clone, Debug)]
pub struct ChunkMap {
    size: usize,
    chunks: HashMap<ChunkCoord, ChunkBuf>,
}

impl ChunkMap {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            chunks: HashMap::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Inserts a chunk; it must be a cube of the map's edge length.
    pub fn insert(&mut self, buf: ChunkBuf) -> Result<Option<ChunkBuf>, ChunkError> {
        let n = self.size;
        if buf.sx != n || buf.sy != n || buf.sz != n {
            return Err(ChunkError::ShapeMismatch {
                expected: n * n * n,
                got: buf.sx * buf.sy * buf.sz,
            });
        }
        Ok(self.chunks.insert(buf.coord, buf))
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Option<ChunkBuf> {
        self.chunks.remove(&coord)
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkBuf> {
        self.chunks.get(&coord)
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Snapshot view of one chunk with this map as the neighbor sampler.
    pub fn view(&self, coord: ChunkCoord) -> Option<ChunkView<'_>> {
        self.chunks.get(&coord).map(|buf| ChunkView::new(buf, self))
    }

    #[inline]
    fn split(&self, wx: i32, wy: i32, wz: i32) -> (ChunkCoord, [usize; 3]) {
        let c = ChunkCoord::containing(wx, wy, wz, self.size);
        let s = self.size as i32;
        (
            c,
            [
                wx.rem_euclid(s) as usize,
                wy.rem_euclid(s) as usize,
                wz.rem_euclid(s) as usize,
            ],
        )
    }

    /// Writes one cell and returns the chunks that must be re-meshed: the owner, then
    /// every loaded face neighbor. Writing into an unloaded chunk, or writing the id
    /// already there, is a no-op and returns nothing.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, id: BlockId) -> Vec<ChunkCoord> {
        let Some(coord) = self.write(wx, wy, wz, id) else {
            return Vec::new();
        };
        let mut dirty = vec![coord];
        dirty.extend(
            coord
                .face_neighbors()
                .into_iter()
                .filter(|n| self.chunks.contains_key(n)),
        );
        dirty
    }

    /// Like [`set_block`](Self::set_block), but dirties exactly the loaded chunks whose
    /// box grown by `reach` cells on every side contains the edited cell, including
    /// edge and corner neighbors. `reach` is how far past its faces a mesher reads.
    pub fn set_block_within(
        &mut self,
        wx: i32,
        wy: i32,
        wz: i32,
        id: BlockId,
        reach: usize,
    ) -> Vec<ChunkCoord> {
        let Some(coord) = self.write(wx, wy, wz, id) else {
            return Vec::new();
        };
        let r = reach as i32;
        let lo = ChunkCoord::containing(wx - r, wy - r, wz - r, self.size);
        let hi = ChunkCoord::containing(wx + r, wy + r, wz + r, self.size);
        let mut dirty = vec![coord];
        for cz in lo.cz..=hi.cz {
            for cy in lo.cy..=hi.cy {
                for cx in lo.cx..=hi.cx {
                    let c = ChunkCoord::new(cx, cy, cz);
                    if c != coord && self.chunks.contains_key(&c) {
                        dirty.push(c);
                    }
                }
            }
        }
        dirty
    }

    /// Stores `id` and returns the owning chunk, or `None` when nothing changed.
    fn write(&mut self, wx: i32, wy: i32, wz: i32, id: BlockId) -> Option<ChunkCoord> {
        let (coord, [lx, ly, lz]) = self.split(wx, wy, wz);
        let Some(buf) = self.chunks.get_mut(&coord) else {
            log::debug!("set_block into unloaded chunk {:?} ignored", coord);
            return None;
        };
        if buf.get_local(lx, ly, lz) == id {
            return None;
        }
        buf.set_local(lx, ly, lz, id);
        Some(coord)
    }
}

impl BlockSampler for ChunkMap {
    #[inline]
    fn sample_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        let (coord, [lx, ly, lz]) = self.split(wx, wy, wz);
        match self.chunks.get(&coord) {
            Some(buf) => buf.get_local(lx, ly, lz),
            None => AIR,
        }
    }
}

impl WorldView for ChunkMap {
    #[inline]
    fn chunk_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    #[inline]
    fn chunk_size(&self) -> usize {
        self.size
    }
}
