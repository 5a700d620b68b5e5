//! `mesher.toml`: which mesher runs and how its output is shaded.

use std::error::Error;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_lighting::LightGrid;

use crate::ao::color_reach;
use crate::density::FieldKind;

/// Surface extraction strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MesherKind {
    Naive,
    #[default]
    Greedy,
    MarchingCubes,
    SurfaceNets,
}

impl MesherKind {
    pub fn is_iso(self) -> bool {
        matches!(self, MesherKind::MarchingCubes | MesherKind::SurfaceNets)
    }

    /// Field the isosurface meshers sample when none is configured.
    pub fn default_field(self) -> FieldKind {
        match self {
            MesherKind::SurfaceNets => FieldKind::Sdf,
            _ => FieldKind::Occupancy,
        }
    }
}

/// Where isosurface normals come from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalMode {
    /// Negated density gradient at each vertex.
    #[default]
    Gradient,
    /// Area-weighted average of adjacent triangle normals.
    Faces,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AoSampling {
    /// The 2x2x2 cells around the vertex's nearest lattice corner.
    #[default]
    Corner,
    /// A `(2 * radius)^3` box of cells centered on the vertex.
    Kernel,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AoCurve {
    Linear,
    #[default]
    Smoothstep,
    /// `occ^gamma`
    Power,
    /// Piecewise-linear through `lut`, evenly spaced over `[0, 1]`.
    Lut,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoConfig {
    pub enabled: bool,
    pub sampling: AoSampling,
    pub radius: usize,
    /// How dark a fully occluded vertex gets, `0..=1`.
    pub strength: f32,
    /// Solid cells out of eight that still count as unoccluded (a flat floor has four).
    pub baseline: f32,
    pub curve: AoCurve,
    pub gamma: f32,
    pub lut: Vec<f32>,
}

impl Default for AoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sampling: AoSampling::Corner,
            radius: 1,
            strength: 0.6,
            baseline: 4.0,
            curve: AoCurve::Smoothstep,
            gamma: 1.5,
            lut: Vec::new(),
        }
    }
}

impl AoConfig {
    /// Maps occlusion in `[0, 1]` through the configured curve.
    pub fn response(&self, occ: f32) -> f32 {
        let x = occ.clamp(0.0, 1.0);
        match self.curve {
            AoCurve::Linear => x,
            AoCurve::Smoothstep => x * x * (3.0 - 2.0 * x),
            AoCurve::Power => x.powf(self.gamma.max(f32::EPSILON)),
            AoCurve::Lut => match self.lut.len() {
                0 => x,
                1 => self.lut[0],
                len => {
                    let f = x * (len - 1) as f32;
                    let i = (f.floor() as usize).min(len - 2);
                    let t = f - i as f32;
                    self.lut[i] + (self.lut[i + 1] - self.lut[i]) * t
                }
            },
        }
        .clamp(0.0, 1.0)
    }

    /// AO factor for the fraction of solid cells around a vertex; 1 is unoccluded.
    pub fn factor(&self, solid_fraction: f32) -> f32 {
        let b = (self.baseline / 8.0).clamp(0.0, 0.999);
        let occ = ((solid_fraction - b) / (1.0 - b)).clamp(0.0, 1.0);
        1.0 - self.strength.clamp(0.0, 1.0) * self.response(occ)
    }
}

/// Top-level mesher settings. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    pub kind: MesherKind,
    pub lod: u8,
    pub chunk_size: usize,
    /// Greedy border freeze width in cells; 0 disables it.
    pub padding: usize,
    pub split_transparent: bool,
    pub iso_level: Option<f32>,
    pub field: Option<FieldKind>,
    /// Signed-distance search radius, in samples.
    pub sdf_radius: usize,
    pub normals: NormalMode,
    /// Weld distance for isosurface meshes; 0 disables welding.
    pub weld_epsilon: f32,
    pub snap: bool,
    pub ao: AoConfig,
    pub tint: bool,
    pub light_floor: u8,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            kind: MesherKind::Greedy,
            lod: 0,
            chunk_size: 16,
            padding: 0,
            split_transparent: true,
            iso_level: None,
            field: None,
            sdf_radius: 2,
            normals: NormalMode::Gradient,
            weld_epsilon: 1e-4,
            snap: true,
            ao: AoConfig::default(),
            tint: false,
            light_floor: 3,
        }
    }
}

impl MesherConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Loads `path`, falling back to defaults (with a warning) when it is missing or bad.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("mesher config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Sampling stride, `2^lod`.
    #[inline]
    pub fn stride(&self) -> usize {
        1usize << self.lod.min(8)
    }

    /// Cells past each chunk face that meshing with these settings reads. An edit that
    /// close to a loaded neighbor changes the neighbor's mesh as well.
    pub fn edit_reach(&self) -> usize {
        let stride = self.stride();
        let surface = if self.kind.is_iso() {
            let sdf = match self.field_kind() {
                FieldKind::Sdf => self.sdf_radius.max(1) * stride,
                FieldKind::Occupancy => 0,
            };
            // Apron corner plus the central difference past it.
            2 * stride + sdf
        } else {
            stride
        };
        surface.max(color_reach(self, stride) as usize)
    }

    pub fn field_kind(&self) -> FieldKind {
        self.field.unwrap_or_else(|| self.kind.default_field())
    }

    pub fn iso(&self) -> f32 {
        self.iso_level.unwrap_or_else(|| self.field_kind().default_iso())
    }

    /// Whether the vertex color pass has anything to do.
    pub fn wants_colors(&self, has_light: bool) -> bool {
        self.ao.enabled || self.tint || has_light
    }
}

/// Per-call inputs to [`crate::generate_chunk_mesh`] besides the blocks themselves.
#[derive(Copy, Clone, Debug)]
pub struct MeshOptions<'a> {
    pub config: &'a MesherConfig,
    pub light: Option<&'a LightGrid>,
}

impl<'a> MeshOptions<'a> {
    pub fn new(config: &'a MesherConfig) -> Self {
        Self {
            config,
            light: None,
        }
    }

    pub fn with_light(mut self, light: &'a LightGrid) -> Self {
        self.light = Some(light);
        self
    }
}
