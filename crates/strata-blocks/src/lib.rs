//! Block ids, atlas tiles, transparency, and the block registry.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod config;
pub mod registry;
pub mod transparency;
pub mod types;

pub use atlas::{AtlasUvTable, UvRect};
pub use registry::{BlockDef, BlockRegistry, DEFAULT_COLOR};
pub use transparency::TransparencySet;
pub use types::{AIR, BlockId, BlockUvs, FaceKind, TileCoord};
