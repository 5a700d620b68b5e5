use strata_geom::Vec3;

use crate::constants::DEGENERATE_AREA2;

/// Growable vertex/index buffers for one surface layer.
///
/// Flat arrays: `pos`/`norm` hold 3 floats per vertex, `uv` 2, `col` 4 bytes.
/// `norm`, `uv` and `col` are either empty or exactly one entry per vertex.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse across calls.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.idx.clear();
        self.col.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        // 4 vertices per quad
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Option<Vec3> {
        if self.norm.len() < (i + 1) * 3 {
            return None;
        }
        Some(Vec3::new(
            self.norm[i * 3],
            self.norm[i * 3 + 1],
            self.norm[i * 3 + 2],
        ))
    }

    /// Appends a bare vertex (position only) and returns its index.
    #[inline]
    pub fn push_position(&mut self, p: Vec3) -> u32 {
        let i = self.vertex_count() as u32;
        self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        i
    }

    /// Appends a triangle unless it repeats an index or has (near) zero area.
    /// Returns whether it was kept.
    #[inline]
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) -> bool {
        if a == b || b == c || a == c {
            return false;
        }
        let pa = self.position(a as usize);
        let pb = self.position(b as usize);
        let pc = self.position(c as usize);
        if (pb - pa).cross(pc - pa).length_squared() <= DEGENERATE_AREA2 {
            return false;
        }
        self.idx.extend_from_slice(&[a, b, c]);
        true
    }

    /// Appends a quad given its corners in perimeter order and the UV of each corner.
    ///
    /// If the corners wind against the expected normal `n` the order is reversed
    /// (`c0, c3, c2, c1`), carrying each corner's UV along so the texture is not mirrored.
    pub fn add_quad_uv(&mut self, corners: [Vec3; 4], n: Vec3, uvs: [[f32; 2]; 4]) {
        let base = self.vertex_count() as u32;
        let mut vs = corners;
        let mut uvs = uvs;
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..4 {
            self.pos.extend_from_slice(&[vs[i].x, vs[i].y, vs[i].z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&uvs[i]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Returns a slice of interleaved vertex positions (x,y,z per vertex).
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }

    /// Returns a slice of interleaved vertex normals (x,y,z per vertex).
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }

    /// Sum of triangle areas.
    pub fn surface_area(&self) -> f32 {
        self.idx
            .chunks_exact(3)
            .map(|t| {
                let a = self.position(t[0] as usize);
                let b = self.position(t[1] as usize);
                let c = self.position(t[2] as usize);
                0.5 * (b - a).cross(c - a).length()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_quad_flips_to_match_normal() {
        let mut mb = MeshBuild::default();
        let corners = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        // (1,0,0) x (1,0,1) = (0,-1,0): reversed for an upward face.
        mb.add_quad_uv(corners, Vec3::UP, [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(mb.position(1), Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(&mb.uv[2..4], &[0.0, 1.0]);
        let a = mb.position(0);
        let n = (mb.position(1) - a).cross(mb.position(2) - a);
        assert!(n.dot(Vec3::UP) > 0.0);
        assert_eq!(mb.idx, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn push_triangle_rejects_degenerates() {
        let mut mb = MeshBuild::default();
        let a = mb.push_position(Vec3::ZERO);
        let b = mb.push_position(Vec3::new(1.0, 0.0, 0.0));
        let c = mb.push_position(Vec3::new(2.0, 0.0, 0.0));
        let d = mb.push_position(Vec3::new(0.0, 1.0, 0.0));
        assert!(!mb.push_triangle(a, a, b));
        assert!(!mb.push_triangle(a, b, c));
        assert!(mb.push_triangle(a, b, d));
        assert_eq!(mb.triangle_count(), 1);
        assert!((mb.surface_area() - 0.5).abs() < 1e-6);
    }
}
