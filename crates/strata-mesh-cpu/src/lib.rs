//! CPU chunk meshing: blocky (naive, greedy) and smooth (marching cubes, surface nets)
//! surface extraction, per-vertex shading, and mesh assembly.
#![forbid(unsafe_code)]

pub mod ao;
pub mod assemble;
pub mod build;
pub mod chunk;
pub mod config;
mod constants;
pub mod density;
pub mod emit;
pub mod face;
pub mod greedy;
pub mod grid;
pub mod layers;
pub mod marching;
pub mod mc_tables;
pub mod mesh_build;
pub mod naive;
pub mod obj;
mod scratch;
pub mod surface_nets;

use strata_chunk::ChunkError;
use thiserror::Error;

pub use ao::{ColorSources, apply_vertex_colors};
pub use assemble::{
    assemble, drop_unreferenced, planar_uvs, smooth_normals, validate, weld,
};
pub use build::{MAX_LOD, generate_chunk_mesh, generate_chunk_mesh_or_empty};
pub use chunk::{ChunkMesh, IndexWidth, MeshIndices, Submesh, SurfaceLayer};
pub use config::{
    AoConfig, AoCurve, AoSampling, MeshOptions, MesherConfig, MesherKind, NormalMode,
};
pub use density::{DensityField, FieldKind, coarse_grid, sample_density};
pub use emit::{BuildSink, FaceRect};
pub use face::Face;
pub use greedy::mesh_greedy;
pub use grid::VoxelGrid;
pub use layers::LayerMode;
pub use marching::{EdgeKey, IsoOptions, march_cubes};
pub use mesh_build::MeshBuild;
pub use naive::mesh_naive;
pub use obj::{save_obj, write_obj};
pub use surface_nets::surface_nets;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("chunk grid is {got:?}, expected a cube of side {expected}")]
    InvalidShape { expected: usize, got: [usize; 3] },
    #[error("lod {lod} does not evenly tile chunk size {size}")]
    InvalidLod { lod: u8, size: usize },
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}
