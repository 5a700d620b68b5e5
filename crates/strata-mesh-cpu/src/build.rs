use std::time::Instant;

use strata_blocks::BlockRegistry;
use strata_chunk::{BlockSampler, BlockWindow, ChunkBuf, ChunkError, ChunkView};
use strata_lighting::LightGrid;

use crate::ao::{ColorSources, apply_vertex_colors, color_reach};
use crate::assemble::{assemble, drop_unreferenced, fill_missing_normals, planar_uvs, weld};
use crate::chunk::ChunkMesh;
use crate::config::{MesherKind, MeshOptions};
use crate::density::{coarse_grid, sample_density};
use crate::greedy::mesh_greedy;
use crate::grid::VoxelGrid;
use crate::layers::LayerMode;
use crate::marching::{IsoOptions, march_cubes};
use crate::mesh_build::MeshBuild;
use crate::naive::mesh_naive;
use crate::scratch::{last_mesh_reserve, update_last_mesh_reserve, with_scratch};
use crate::surface_nets::surface_nets;
use crate::MeshError;

/// Largest supported LOD; stride `2^8` already exceeds any sensible chunk.
pub const MAX_LOD: u8 = 8;

#[derive(Default)]
struct MesherPerf {
    sample_ms: u32,
    mesh_ms: u32,
    post_ms: u32,
    color_ms: u32,
    total_ms: u32,
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn prepare_builds() -> [MeshBuild; 2] {
    let caps = last_mesh_reserve();
    let mut builds = [MeshBuild::default(), MeshBuild::default()];
    for (mb, cap) in builds.iter_mut().zip(caps) {
        mb.reserve_quads(cap);
    }
    builds
}

fn log_mesher_perf(
    kind: MesherKind,
    stride: usize,
    grid: &ChunkBuf,
    mesh: &ChunkMesh,
    perf: &MesherPerf,
) {
    log::info!(
        target: "perf",
        "ms sample={} mesh={} post={} color={} total={} mesher_chunk kind={:?} stride={} \
         cx={} cy={} cz={} verts={} tris={}",
        perf.sample_ms,
        perf.mesh_ms,
        perf.post_ms,
        perf.color_ms,
        perf.total_ms,
        kind,
        stride,
        grid.coord.cx,
        grid.coord.cy,
        grid.coord.cz,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
}

/// Rejects grids that do not match the configured cube and LODs that do not tile it.
fn check_request(grid: &ChunkBuf, size: usize, lod: u8) -> Result<usize, MeshError> {
    let dims = grid.dims();
    let expected = dims[0] * dims[1] * dims[2];
    if grid.blocks.len() != expected {
        return Err(ChunkError::ShapeMismatch {
            expected,
            got: grid.blocks.len(),
        }
        .into());
    }
    if dims != [size, size, size] || size == 0 {
        return Err(MeshError::InvalidShape {
            expected: size,
            got: dims,
        });
    }
    if lod > MAX_LOD {
        return Err(MeshError::InvalidLod { lod, size });
    }
    let stride = 1usize << lod;
    if stride > size || size % stride != 0 {
        return Err(MeshError::InvalidLod { lod, size });
    }
    Ok(stride)
}

fn mesh_blocky(
    kind: MesherKind,
    view: &ChunkView<'_>,
    reg: &BlockRegistry,
    mode: LayerMode,
    stride: usize,
    padding: usize,
    builds: &mut [MeshBuild; 2],
) -> usize {
    let grid = if stride == 1 {
        let storage = with_scratch(|s| std::mem::take(&mut s.cells));
        VoxelGrid::from_view_into(view, storage)
    } else {
        coarse_grid(view, stride)
    };
    let quads = match kind {
        MesherKind::Naive => mesh_naive(&grid, &reg.atlas, mode, builds),
        _ => mesh_greedy(&grid, &reg.atlas, mode, padding, builds),
    };
    let cells = grid.into_cells();
    with_scratch(|s| s.cells = cells);
    quads
}

/// Meshes one chunk.
///
/// `world` answers lookups outside `grid` (neighbor chunks); anything it does not know
/// must read as air. The transparency set comes from `reg`; the mesher kind, LOD and
/// shading come from `opts`. Positions are chunk-local.
pub fn generate_chunk_mesh(
    grid: &ChunkBuf,
    world: &dyn BlockSampler,
    reg: &BlockRegistry,
    opts: &MeshOptions<'_>,
) -> Result<ChunkMesh, MeshError> {
    let cfg = opts.config;
    let stride = check_request(grid, cfg.chunk_size, cfg.lod)?;
    let total_start = Instant::now();
    let mut perf = MesherPerf::default();
    let view = ChunkView::new(grid, world);
    let origin = grid.origin();
    let mut builds = prepare_builds();

    if cfg.kind.is_iso() {
        let t_sample = Instant::now();
        let field = sample_density(&view, stride, cfg.field_kind(), cfg.sdf_radius);
        perf.sample_ms = elapsed_ms(t_sample);

        let t_mesh = Instant::now();
        let iso = IsoOptions {
            iso: cfg.iso(),
            normals: cfg.normals,
            snap: cfg.snap,
        };
        let build = &mut builds[0];
        match cfg.kind {
            MesherKind::SurfaceNets => surface_nets(&field, iso, build),
            _ => march_cubes(&field, iso, build),
        };
        perf.mesh_ms = elapsed_ms(t_mesh);

        let t_post = Instant::now();
        // Surface nets leaves apron vertices no quad uses.
        if cfg.weld_epsilon > 0.0 {
            weld(build, cfg.weld_epsilon);
        } else {
            drop_unreferenced(build);
        }
        fill_missing_normals(build);
        planar_uvs(build, origin);
        perf.post_ms = elapsed_ms(t_post);
    } else {
        let t_mesh = Instant::now();
        let mode = LayerMode::new(cfg.split_transparent, reg.transparent);
        mesh_blocky(cfg.kind, &view, reg, mode, stride, cfg.padding, &mut builds);
        update_last_mesh_reserve([builds[0].vertex_count() / 4, builds[1].vertex_count() / 4]);
        perf.mesh_ms = elapsed_ms(t_mesh);
    }

    let light = opts.light.filter(|l| {
        let ok = [l.sx, l.sy, l.sz] == grid.dims();
        if !ok {
            log::warn!(
                "light grid {}x{}x{} does not match chunk {:?}; meshing unlit",
                l.sx,
                l.sy,
                l.sz,
                grid.coord
            );
        }
        ok
    });
    if cfg.wants_colors(light.is_some()) && builds.iter().any(|b| !b.is_empty()) {
        let t_color = Instant::now();
        shade(&mut builds, &view, reg, stride, light, opts);
        perf.color_ms = elapsed_ms(t_color);
    }

    let mesh = assemble(grid.coord, &mut builds);
    perf.total_ms = elapsed_ms(total_start);
    log_mesher_perf(cfg.kind, stride, grid, &mesh, &perf);
    Ok(mesh)
}

fn shade(
    builds: &mut [MeshBuild; 2],
    view: &ChunkView<'_>,
    reg: &BlockRegistry,
    stride: usize,
    light: Option<&LightGrid>,
    opts: &MeshOptions<'_>,
) {
    let cfg = opts.config;
    let reach = color_reach(cfg, stride);
    let origin = view.buf.origin();
    let min = [origin[0] - reach, origin[1] - reach, origin[2] - reach];
    let dims = view.buf.dims().map(|d| d + 2 * reach as usize);
    let storage = with_scratch(|s| std::mem::take(&mut s.window));
    let window = BlockWindow::capture_into(view, min, dims, storage);
    let src = ColorSources {
        blocks: &window,
        origin,
        stride,
        registry: reg,
        light,
    };
    for build in builds.iter_mut().filter(|b| !b.is_empty()) {
        fill_missing_normals(build);
        apply_vertex_colors(build, &src, cfg);
    }
    let storage = window.into_storage();
    with_scratch(|s| s.window = storage);
}

/// Like [`generate_chunk_mesh`], but a failure yields an empty mesh flagged for retry.
pub fn generate_chunk_mesh_or_empty(
    grid: &ChunkBuf,
    world: &dyn BlockSampler,
    reg: &BlockRegistry,
    opts: &MeshOptions<'_>,
) -> ChunkMesh {
    match generate_chunk_mesh(grid, world, reg, opts) {
        Ok(mesh) => mesh,
        Err(e) => {
            log::warn!("chunk {:?} failed to mesh: {}; rendering empty", grid.coord, e);
            ChunkMesh {
                retry: true,
                ..ChunkMesh::empty(grid.coord)
            }
        }
    }
}
