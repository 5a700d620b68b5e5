use strata_chunk::ChunkCoord;
use strata_geom::Aabb;

/// Render pass a submesh belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SurfaceLayer {
    Opaque = 0,
    Transparent = 1,
}

impl SurfaceLayer {
    pub const ALL: [SurfaceLayer; 2] = [SurfaceLayer::Opaque, SurfaceLayer::Transparent];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndexWidth {
    U16,
    U32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeshIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Default for MeshIndices {
    fn default() -> Self {
        MeshIndices::U16(Vec::new())
    }
}

impl MeshIndices {
    #[inline]
    pub fn width(&self) -> IndexWidth {
        match self {
            MeshIndices::U16(_) => IndexWidth::U16,
            MeshIndices::U32(_) => IndexWidth::U32,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            MeshIndices::U16(v) => v.len(),
            MeshIndices::U32(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        match self {
            MeshIndices::U16(v) => v[i] as u32,
            MeshIndices::U32(v) => v[i],
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            MeshIndices::U16(v) => Box::new(v.iter().map(|i| *i as u32)),
            MeshIndices::U32(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn to_u32(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Contiguous index and vertex range of one layer inside a [`ChunkMesh`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Submesh {
    pub layer: SurfaceLayer,
    pub index_start: usize,
    pub index_count: usize,
    pub vertex_start: usize,
    pub vertex_count: usize,
}

/// Final mesh of one chunk, positions in chunk-local space.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    pub coord: ChunkCoord,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Option<Vec<[u8; 4]>>,
    pub indices: MeshIndices,
    pub submeshes: Vec<Submesh>,
    pub bounds: Aabb,
    /// Set when meshing failed and this empty mesh stands in; the caller should try again.
    pub retry: bool,
}

impl ChunkMesh {
    pub fn empty(coord: ChunkCoord) -> Self {
        ChunkMesh {
            coord,
            ..Default::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn submesh(&self, layer: SurfaceLayer) -> Option<&Submesh> {
        self.submeshes.iter().find(|s| s.layer == layer)
    }

    /// Triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| {
            [
                self.indices.get(t * 3),
                self.indices.get(t * 3 + 1),
                self.indices.get(t * 3 + 2),
            ]
        })
    }

    /// Sum of triangle areas.
    pub fn surface_area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| {
                let pa = self.positions[a as usize];
                let pb = self.positions[b as usize];
                let pc = self.positions[c as usize];
                let ab = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
                let ac = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
                let cx = ab[1] * ac[2] - ab[2] * ac[1];
                let cy = ab[2] * ac[0] - ab[0] * ac[2];
                let cz = ab[0] * ac[1] - ab[1] * ac[0];
                0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
            })
            .sum()
    }
}
