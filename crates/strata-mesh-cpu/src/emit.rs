use strata_blocks::{AtlasUvTable, BlockId};
use strata_geom::Vec3;

use crate::chunk::SurfaceLayer;
use crate::constants::INITIAL_QUAD_CAP;
use crate::face::Face;
use crate::mesh_build::MeshBuild;

/// Sink for per-layer mesh buffers.
pub trait BuildSink {
    fn get_build_mut(&mut self, layer: SurfaceLayer) -> &mut MeshBuild;
}

impl BuildSink for [MeshBuild; 2] {
    #[inline]
    fn get_build_mut(&mut self, layer: SurfaceLayer) -> &mut MeshBuild {
        let mb = &mut self[layer.index()];
        if mb.pos.capacity() == 0 {
            mb.reserve_quads(INITIAL_QUAD_CAP);
        }
        mb
    }
}

/// Everything written to a single buffer regardless of layer.
impl BuildSink for MeshBuild {
    #[inline]
    fn get_build_mut(&mut self, _layer: SurfaceLayer) -> &mut MeshBuild {
        self
    }
}

/// One merged face rectangle on a sweep plane, in grid units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceRect {
    pub face: Face,
    /// Plane coordinate along the face axis.
    pub plane: i32,
    /// Start along the first in-plane axis `(axis + 1) % 3`.
    pub u: i32,
    /// Start along the second in-plane axis `(axis + 2) % 3`.
    pub v: i32,
    pub w: i32,
    pub h: i32,
    pub id: BlockId,
}

/// Emits a rectangle into the layer's build, scaling grid units by `scale`.
///
/// The block's tile for the face kind is stretched across the whole quad.
#[inline]
pub(crate) fn emit_face_rect(
    builds: &mut impl BuildSink,
    layer: SurfaceLayer,
    atlas: &AtlasUvTable,
    rect: FaceRect,
    scale: f32,
) {
    let d = rect.face.axis();
    let ua = (d + 1) % 3;
    let va = (d + 2) % 3;
    let mut p = [0f32; 3];
    p[d] = rect.plane as f32 * scale;
    p[ua] = rect.u as f32 * scale;
    p[va] = rect.v as f32 * scale;
    let mut du = [0f32; 3];
    du[ua] = rect.w as f32 * scale;
    let mut dv = [0f32; 3];
    dv[va] = rect.h as f32 * scale;

    let v0 = Vec3::from_array(p);
    let vdu = Vec3::from_array(du);
    let vdv = Vec3::from_array(dv);
    let r = atlas.face_rect(rect.id, rect.face.kind());
    let uvs = [
        [r.min[0], r.min[1]],
        [r.max[0], r.min[1]],
        [r.max[0], r.max[1]],
        [r.min[0], r.max[1]],
    ];
    builds.get_build_mut(layer).add_quad_uv(
        [v0, v0 + vdu, v0 + vdu + vdv, v0 + vdv],
        rect.face.normal(),
        uvs,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_geometry_and_uvs() {
        let atlas = AtlasUvTable::default();
        let mut mb = MeshBuild::default();
        let rect = FaceRect {
            face: Face::NegX,
            plane: 3,
            u: 1,
            v: 2,
            w: 2,
            h: 1,
            id: 0,
        };
        emit_face_rect(&mut mb, SurfaceLayer::Opaque, &atlas, rect, 2.0);
        assert_eq!(mb.vertex_count(), 4);
        for i in 0..4 {
            assert_eq!(mb.position(i).x, 6.0);
        }
        let a = mb.position(0);
        let n = (mb.position(1) - a).cross(mb.position(2) - a);
        assert!(n.x < 0.0);
        assert!((mb.surface_area() - 8.0).abs() < 1e-5);
        let r = atlas.face_rect(0, Face::NegX.kind());
        assert!(mb.uv.chunks(2).all(|uv| uv[0] == r.min[0] || uv[0] == r.max[0]));
    }
}
