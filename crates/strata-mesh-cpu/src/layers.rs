use strata_blocks::{BlockId, TransparencySet};

use crate::chunk::SurfaceLayer;

/// How block ids are split across surface layers for the blocky meshers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerMode {
    /// Every non-air id is solid; one opaque layer.
    Single,
    /// Opaque pass treats transparent ids as empty; transparent pass sees only them.
    Split(TransparencySet),
}

impl LayerMode {
    /// Split mode only when it has something to split.
    pub fn new(split: bool, transparent: TransparencySet) -> Self {
        if split && !transparent.is_empty() {
            LayerMode::Split(transparent)
        } else {
            LayerMode::Single
        }
    }

    pub fn layers(&self) -> &'static [SurfaceLayer] {
        match self {
            LayerMode::Single => &[SurfaceLayer::Opaque],
            LayerMode::Split(_) => &SurfaceLayer::ALL,
        }
    }

    #[inline]
    pub fn is_solid(&self, layer: SurfaceLayer, id: BlockId) -> bool {
        match (self, layer) {
            (LayerMode::Single, _) => id != 0,
            (LayerMode::Split(t), SurfaceLayer::Opaque) => id != 0 && !t.contains(id),
            (LayerMode::Split(t), SurfaceLayer::Transparent) => t.contains(id),
        }
    }
}
