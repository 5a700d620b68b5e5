use strata_blocks::{AIR, BlockId};
use strata_chunk::ChunkView;

/// Block ids of a chunk (or of its coarse LOD reduction) plus a one-cell apron.
///
/// Cells are addressed `-1 ..= n` per axis; the apron holds the neighbors' boundary
/// cells so face tests never leave the grid. `scale` is the edge length of one cell
/// in voxels.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    pub n: [usize; 3],
    pub scale: usize,
    cells: Vec<BlockId>,
}

impl VoxelGrid {
    /// Builds a grid from already-aggregated cells, `(n + 2)^3` of them including apron.
    pub fn from_cells(n: [usize; 3], scale: usize, cells: Vec<BlockId>) -> Self {
        debug_assert_eq!(cells.len(), (n[0] + 2) * (n[1] + 2) * (n[2] + 2));
        Self { n, scale, cells }
    }

    /// Full-resolution grid for a chunk view; apron cells come from the view's sampler.
    pub fn from_view(view: &ChunkView<'_>) -> Self {
        Self::from_view_into(view, Vec::new())
    }

    pub fn from_view_into(view: &ChunkView<'_>, mut storage: Vec<BlockId>) -> Self {
        let n = view.buf.dims();
        storage.clear();
        storage.resize((n[0] + 2) * (n[1] + 2) * (n[2] + 2), AIR);
        let mut grid = Self {
            n,
            scale: 1,
            cells: storage,
        };
        for z in -1..=n[2] as i32 {
            for y in -1..=n[1] as i32 {
                for x in -1..=n[0] as i32 {
                    let inside = x >= 0
                        && y >= 0
                        && z >= 0
                        && x < n[0] as i32
                        && y < n[1] as i32
                        && z < n[2] as i32;
                    // Only face-adjacent apron cells are ever read.
                    let outside_axes = [x, y, z]
                        .iter()
                        .zip(n.iter())
                        .filter(|(c, len)| **c < 0 || **c >= **len as i32)
                        .count();
                    if !inside && outside_axes > 1 {
                        continue;
                    }
                    let i = grid.index(x, y, z);
                    grid.cells[i] = view.get_rel(x, y, z);
                }
            }
        }
        grid
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        let sx = self.n[0] + 2;
        let sy = self.n[1] + 2;
        ((z + 1) as usize * sy + (y + 1) as usize) * sx + (x + 1) as usize
    }

    /// Cell at `(x, y, z)`, each in `-1 ..= n`; anything further out reads as air.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        if x < -1
            || y < -1
            || z < -1
            || x > self.n[0] as i32
            || y > self.n[1] as i32
            || z > self.n[2] as i32
        {
            return AIR;
        }
        self.cells[self.index(x, y, z)]
    }

    #[inline]
    pub fn get_arr(&self, p: [i32; 3]) -> BlockId {
        self.get(p[0], p[1], p[2])
    }

    /// Returns the cell storage for reuse.
    pub fn into_cells(self) -> Vec<BlockId> {
        self.cells
    }
}
