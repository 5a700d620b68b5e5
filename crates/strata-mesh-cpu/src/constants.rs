//! Shared constants for strata-mesh-cpu. Centralizes common magic numbers.

// Index width
pub(crate) const U16_VERTEX_LIMIT: usize = 65535; // more vertices than this needs u32 indices

// Numeric tolerances
pub(crate) const SNAP_EPS: f32 = 1e-5; // isosurface vertex snapping grid
pub(crate) const INTERP_EPS: f32 = 1e-5; // interpolation endpoint guard
// Triangles whose squared cross-product length falls below this are dropped
pub(crate) const DEGENERATE_AREA2: f32 = 1e-12;

// Occupancy fraction at which a coarse LOD cell counts as solid
pub(crate) const COARSE_SOLID_FRACTION: f32 = 0.5;

// Light
pub(crate) const MAX_LIGHT_F: f32 = 15.0;

// Colors
pub(crate) const OPAQUE_ALPHA: u8 = 255;

// Lazy per-layer reserve when a layer is first written in a chunk
pub(crate) const INITIAL_QUAD_CAP: usize = 64;
