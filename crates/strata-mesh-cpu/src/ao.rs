//! Per-vertex color: ambient occlusion, material tint and light, multiplied together.
//!
//! Purely cosmetic. Reads blocks around each vertex and writes `build.col`; positions,
//! normals and indices are left untouched.

use std::time::Instant;

use strata_blocks::{AIR, BlockId, BlockRegistry, DEFAULT_COLOR};
use strata_chunk::BlockSampler;
use strata_geom::Vec3;
use strata_lighting::LightGrid;

use crate::config::{AoSampling, MesherConfig};
use crate::constants::{MAX_LIGHT_F, OPAQUE_ALPHA};
use crate::mesh_build::MeshBuild;

/// Where the color pass reads its inputs.
#[derive(Copy, Clone)]
pub struct ColorSources<'a> {
    /// World-space block lookup; a captured window around the chunk works best.
    pub blocks: &'a dyn BlockSampler,
    /// World position of the mesh's local origin.
    pub origin: [i32; 3],
    pub stride: usize,
    pub registry: &'a BlockRegistry,
    pub light: Option<&'a LightGrid>,
}

impl ColorSources<'_> {
    #[inline]
    fn occludes(&self, id: BlockId) -> bool {
        id != AIR && !self.registry.is_transparent(id)
    }

    #[inline]
    fn is_occluding(&self, p: [i32; 3]) -> bool {
        self.occludes(self.blocks.sample_block(p[0], p[1], p[2]))
    }
}

/// Blocks that [`apply_vertex_colors`] may read, as a world-space box around a chunk.
pub fn color_reach(cfg: &MesherConfig, stride: usize) -> i32 {
    let ao = match cfg.ao.sampling {
        AoSampling::Corner => 1,
        AoSampling::Kernel => cfg.ao.radius.max(1) as i32,
    };
    let tint = tint_radius(stride).ceil() as i32 + 1;
    ao.max(tint) + 1
}

#[inline]
fn tint_radius(stride: usize) -> f32 {
    (1.5 * stride as f32).max(1.0)
}

/// Fraction of occluding cells around lattice point `c`.
fn solid_fraction(
    src: &ColorSources<'_>,
    c: [i32; 3],
    sampling: AoSampling,
    radius: usize,
) -> f32 {
    let r = match sampling {
        AoSampling::Corner => 1,
        AoSampling::Kernel => radius.max(1) as i32,
    };
    let mut solid = 0u32;
    let mut total = 0u32;
    for dz in -r..r {
        for dy in -r..r {
            for dx in -r..r {
                total += 1;
                if src.is_occluding([c[0] + dx, c[1] + dy, c[2] + dz]) {
                    solid += 1;
                }
            }
        }
    }
    solid as f32 / total as f32
}

/// Distance-weighted average block color within the tint radius of `p` (world space).
fn tint_at(src: &ColorSources<'_>, p: Vec3) -> [f32; 3] {
    let r = tint_radius(src.stride);
    let step = src.stride.max(1) as i32;
    let reach = (r / step as f32).ceil() as i32;
    let base = [p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32];
    let mut acc = [0f32; 3];
    let mut wsum = 0f32;
    for kz in -reach..=reach {
        for ky in -reach..=reach {
            for kx in -reach..=reach {
                let c = [base[0] + kx * step, base[1] + ky * step, base[2] + kz * step];
                let id = src.blocks.sample_block(c[0], c[1], c[2]);
                if id == AIR {
                    continue;
                }
                let center = Vec3::new(c[0] as f32 + 0.5, c[1] as f32 + 0.5, c[2] as f32 + 0.5);
                let w = 1.0 - center.distance(p) / r;
                if w <= 0.0 {
                    continue;
                }
                let col = src.registry.color(id);
                for (a, &ch) in acc.iter_mut().zip(col.iter()) {
                    *a += ch as f32 * w;
                }
                wsum += w;
            }
        }
    }
    if wsum <= 0.0 {
        return DEFAULT_COLOR.map(f32::from);
    }
    acc.map(|a| a / wsum)
}

/// Writes one RGBA8 color per vertex of `build` into `build.col`.
pub fn apply_vertex_colors(build: &mut MeshBuild, src: &ColorSources<'_>, cfg: &MesherConfig) {
    let t0 = Instant::now();
    let verts = build.vertex_count();
    let origin = Vec3::new(src.origin[0] as f32, src.origin[1] as f32, src.origin[2] as f32);
    let floor = f32::from(cfg.light_floor).min(MAX_LIGHT_F);
    build.col.clear();
    build.col.reserve(verts * 4);
    for i in 0..verts {
        let local = build.position(i);
        let world = local + origin;
        let mut rgb = [255f32; 3];
        if cfg.tint {
            rgb = tint_at(src, world);
        }
        let mut mul = 1.0f32;
        if cfg.ao.enabled {
            let c = [
                world.x.round() as i32,
                world.y.round() as i32,
                world.z.round() as i32,
            ];
            mul *= cfg.ao.factor(solid_fraction(src, c, cfg.ao.sampling, cfg.ao.radius));
        }
        if let Some(light) = src.light {
            let n = build.normal(i).unwrap_or(Vec3::ZERO);
            let q = local + n * 0.5;
            let [qx, qy, qz] = [q.x, q.y, q.z].map(|v| v.floor() as i32);
            let level = light.get_clamped(qx, qy, qz);
            mul *= f32::from(level).max(floor) / MAX_LIGHT_F;
        }
        for ch in rgb {
            build.col.push((ch * mul).round().clamp(0.0, 255.0) as u8);
        }
        build.col.push(OPAQUE_ALPHA);
    }
    log::debug!(
        target: "perf",
        "ms={:.2} vertex_colors verts={} ao={} tint={} light={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        verts,
        cfg.ao.enabled,
        cfg.tint,
        src.light.is_some()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AoConfig;

    fn floor_world(x: i32, y: i32, _z: i32) -> BlockId {
        // Ground below y = 0, plus a wall at x >= 4.
        if y < 0 || x >= 4 { 1 } else { 0 }
    }

    fn one_vertex(p: Vec3) -> MeshBuild {
        let mut mb = MeshBuild::default();
        mb.push_position(p);
        mb.norm.extend_from_slice(&[0.0, 1.0, 0.0]);
        mb
    }

    #[test]
    fn open_floor_is_unoccluded_and_corner_darkens() {
        let reg = BlockRegistry::builtin();
        let world = floor_world;
        let src = ColorSources {
            blocks: &world,
            origin: [0, 0, 0],
            stride: 1,
            registry: &reg,
            light: None,
        };
        let cfg = MesherConfig::default();
        let mut open = one_vertex(Vec3::new(1.0, 0.0, 1.0));
        apply_vertex_colors(&mut open, &src, &cfg);
        assert_eq!(&open.col[..], &[255, 255, 255, 255]);

        let mut corner = one_vertex(Vec3::new(4.0, 0.0, 1.0));
        apply_vertex_colors(&mut corner, &src, &cfg);
        assert!(corner.col[0] < 255);
        assert_eq!(corner.col[3], 255);
        // Geometry untouched.
        assert_eq!(corner.position(0), Vec3::new(4.0, 0.0, 1.0));
    }

    #[test]
    fn light_floor_limits_darkness() {
        let reg = BlockRegistry::builtin();
        let world = |_x: i32, _y: i32, _z: i32| 0u8;
        let light = LightGrid::new(4, 4, 4);
        let src = ColorSources {
            blocks: &world,
            origin: [0, 0, 0],
            stride: 1,
            registry: &reg,
            light: Some(&light),
        };
        let cfg = MesherConfig {
            light_floor: 5,
            ao: AoConfig {
                enabled: false,
                ..AoConfig::default()
            },
            ..MesherConfig::default()
        };
        let mut mb = one_vertex(Vec3::new(1.0, 1.0, 1.0));
        apply_vertex_colors(&mut mb, &src, &cfg);
        assert_eq!(mb.col[0], 85);
    }

    #[test]
    fn tint_falls_back_to_brown_in_air() {
        let reg = BlockRegistry::builtin();
        let world = |_x: i32, _y: i32, _z: i32| 0u8;
        let src = ColorSources {
            blocks: &world,
            origin: [0, 0, 0],
            stride: 1,
            registry: &reg,
            light: None,
        };
        let cfg = MesherConfig {
            tint: true,
            ..MesherConfig::default()
        };
        let mut mb = one_vertex(Vec3::new(1.0, 1.0, 1.0));
        apply_vertex_colors(&mut mb, &src, &cfg);
        assert_eq!(&mb.col[..3], &DEFAULT_COLOR);
    }
}
