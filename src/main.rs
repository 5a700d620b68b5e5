//! `strata`: mesh synthetic or dumped chunks from the command line.
#![forbid(unsafe_code)]

mod scenes;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use hashbrown::HashSet;
use serde::de::IntoDeserializer;
use serde::de::value::StrDeserializer;
use serde::{Deserialize, Serialize};
use strata_blocks::BlockRegistry;
use strata_chunk::io::{chunk_from_csv, chunk_to_csv};
use strata_chunk::{ChunkBuf, ChunkCoord, ChunkMap};
use strata_lighting::compute_chunk_lightmap;
use strata_mesh_cpu::{
    ChunkMesh, IndexWidth, MeshOptions, MesherConfig, MesherKind, generate_chunk_mesh, save_obj,
};
use strata_runtime::{MeshJob, MeshRuntime, SharedWorld};

use crate::scenes::Scene;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Voxel chunk meshing toolkit")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mesh one chunk and report statistics
    Mesh(MeshArgs),
    /// Write a chunk of a synthetic scene as CSV
    Dump(DumpArgs),
    /// Mesh a ring of chunks through the worker pool
    BenchWorld(BenchArgs),
}

#[derive(Args, Debug)]
struct MesherArgs {
    /// Mesher to run; overrides the config file
    #[arg(long, value_parser = parse_kind)]
    kind: Option<MesherKind>,
    /// Level of detail (sampling stride 2^lod); overrides the config file
    #[arg(long)]
    lod: Option<u8>,
    /// Mesher config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Block registry (TOML); the built-in set when omitted
    #[arg(long)]
    blocks: Option<PathBuf>,
    /// Shade with a computed lightmap
    #[arg(long)]
    light: bool,
}

#[derive(Args, Debug)]
struct MeshArgs {
    #[arg(long, value_enum, default_value = "waves")]
    scene: Scene,
    /// CSV dump, required with `--scene file`
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, value_parser = parse_coord, default_value = "0,0,0")]
    chunk: ChunkCoord,
    #[command(flatten)]
    mesher: MesherArgs,
    /// Write the mesh as Wavefront OBJ
    #[arg(long)]
    obj: Option<PathBuf>,
    /// Write mesh statistics as TOML
    #[arg(long)]
    stats: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DumpArgs {
    #[arg(long, value_enum, default_value = "waves")]
    scene: Scene,
    #[arg(long, value_parser = parse_coord, default_value = "0,0,0")]
    chunk: ChunkCoord,
    #[arg(long, default_value_t = 16)]
    size: usize,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[arg(long, value_enum, default_value = "waves")]
    scene: Scene,
    /// Chunks meshed: (2R+1)^2 columns, one chunk tall
    #[arg(long, default_value_t = 4)]
    radius: i32,
    #[arg(long)]
    workers: Option<usize>,
    #[command(flatten)]
    mesher: MesherArgs,
}

#[derive(Serialize, Debug)]
struct MeshStats {
    chunk: [i32; 3],
    kind: MesherKind,
    lod: u8,
    vertices: usize,
    triangles: usize,
    submeshes: usize,
    index_width: String,
    surface_area: f32,
    colored: bool,
    ms: f64,
}

impl MeshStats {
    fn new(mesh: &ChunkMesh, cfg: &MesherConfig, ms: f64) -> Self {
        let c = mesh.coord;
        let index_width = match mesh.indices.width() {
            IndexWidth::U16 => "u16",
            IndexWidth::U32 => "u32",
        };
        Self {
            chunk: [c.cx, c.cy, c.cz],
            kind: cfg.kind,
            lod: cfg.lod,
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            submeshes: mesh.submeshes.len(),
            index_width: index_width.to_string(),
            surface_area: mesh.surface_area(),
            colored: mesh.colors.is_some(),
            ms,
        }
    }
}

fn parse_coord(s: &str) -> Result<ChunkCoord, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,Z, got '{s}'"));
    }
    let mut v = [0i32; 3];
    for (slot, p) in v.iter_mut().zip(parts) {
        *slot = p.parse().map_err(|_| format!("bad coordinate '{p}'"))?;
    }
    Ok(ChunkCoord::new(v[0], v[1], v[2]))
}

/// Mesher name as written in config files; dashes are accepted for underscores.
fn parse_kind(s: &str) -> Result<MesherKind, String> {
    let name = s.trim().replace('-', "_");
    let de: StrDeserializer<'_, serde::de::value::Error> = name.as_str().into_deserializer();
    MesherKind::deserialize(de).map_err(|e| e.to_string())
}

fn load_registry(path: Option<&Path>) -> Result<BlockRegistry, Box<dyn Error>> {
    match path {
        Some(p) => BlockRegistry::load_from_path(p),
        None => Ok(BlockRegistry::builtin()),
    }
}

fn load_config(args: &MesherArgs) -> MesherConfig {
    let mut cfg = match args.config.as_deref() {
        Some(p) => MesherConfig::load_or_default(p),
        None => MesherConfig::default(),
    };
    if let Some(kind) = args.kind {
        cfg.kind = kind;
    }
    if let Some(lod) = args.lod {
        cfg.lod = lod;
    }
    cfg
}

/// The chunk to mesh plus the world it sits in.
fn load_chunk(
    scene: Scene,
    input: Option<&Path>,
    coord: ChunkCoord,
    size: usize,
) -> Result<(ChunkBuf, SharedWorld), Box<dyn Error>> {
    if let Some(world) = scenes::sampler(scene) {
        let buf = ChunkBuf::from_sampler(coord, size, world.as_ref());
        return Ok((buf, world));
    }
    let Some(path) = input else {
        return Err("--scene file needs --input <chunk.csv>".into());
    };
    let text = fs::read_to_string(path)?;
    let buf = chunk_from_csv(coord, size, size, size, &text)?;
    let mut map = ChunkMap::new(size);
    map.insert(buf.clone())?;
    let world: SharedWorld = Arc::new(map);
    Ok((buf, world))
}

fn run_mesh(args: MeshArgs) -> Result<(), Box<dyn Error>> {
    let reg = load_registry(args.mesher.blocks.as_deref())?;
    let cfg = load_config(&args.mesher);
    let (buf, world) = load_chunk(args.scene, args.input.as_deref(), args.chunk, cfg.chunk_size)?;

    let t0 = Instant::now();
    let light = args
        .mesher
        .light
        .then(|| compute_chunk_lightmap(&buf, world.as_ref(), &reg));
    let mut opts = MeshOptions::new(&cfg);
    if let Some(lg) = light.as_ref() {
        opts = opts.with_light(lg);
    }
    let mesh = generate_chunk_mesh(&buf, world.as_ref(), &reg, &opts)?;
    let ms = t0.elapsed().as_secs_f64() * 1000.0;

    let stats = MeshStats::new(&mesh, &cfg, ms);
    log::info!(
        "chunk {:?} kind={:?} lod={} verts={} tris={} submeshes={} area={:.2} ms={:.2}",
        args.chunk,
        cfg.kind,
        cfg.lod,
        stats.vertices,
        stats.triangles,
        stats.submeshes,
        stats.surface_area,
        ms
    );
    if let Some(path) = args.obj.as_deref() {
        save_obj(&mesh, buf.origin(), path)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(path) = args.stats.as_deref() {
        fs::write(path, toml::to_string(&stats)?)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn run_dump(args: DumpArgs) -> Result<(), Box<dyn Error>> {
    let Some(world) = scenes::sampler(args.scene) else {
        return Err("dump needs a synthetic scene".into());
    };
    let buf = ChunkBuf::from_sampler(args.chunk, args.size.max(1), world.as_ref());
    fs::write(&args.out, chunk_to_csv(&buf))?;
    log::info!(
        "dumped {:?} chunk {:?} ({} solid) to {}",
        args.scene,
        args.chunk,
        buf.solid_count(),
        args.out.display()
    );
    Ok(())
}

fn run_bench_world(args: BenchArgs) -> Result<(), Box<dyn Error>> {
    let Some(sampler) = scenes::sampler(args.scene) else {
        return Err("bench-world needs a synthetic scene".into());
    };
    let reg = Arc::new(load_registry(args.mesher.blocks.as_deref())?);
    let cfg = Arc::new(load_config(&args.mesher));
    let size = cfg.chunk_size;
    let r = args.radius.max(0);

    let t_gen = Instant::now();
    let mut map = ChunkMap::new(size);
    for cz in -r..=r {
        for cx in -r..=r {
            let coord = ChunkCoord::new(cx, 0, cz);
            map.insert(ChunkBuf::from_sampler(coord, size, sampler.as_ref()))?;
        }
    }
    let map = Arc::new(map);
    log::info!(
        "generated {} chunks in {:.1} ms",
        map.len(),
        t_gen.elapsed().as_secs_f64() * 1000.0
    );

    let mut rt = match args.workers {
        Some(n) => MeshRuntime::with_workers(n),
        None => MeshRuntime::new(),
    };
    let world: SharedWorld = map.clone();
    let mut pending: HashSet<ChunkCoord> = HashSet::new();
    let t0 = Instant::now();
    for coord in map.coords() {
        let Some(buf) = map.get(coord) else {
            continue;
        };
        rt.submit(MeshJob {
            coord,
            rev: 1,
            buf: buf.clone(),
            world: world.clone(),
            reg: reg.clone(),
            config: cfg.clone(),
            with_light: args.mesher.light,
        });
        pending.insert(coord);
    }

    let (mut tris, mut verts, mut retries) = (0usize, 0usize, 0usize);
    let mut mesh_ms_sum = 0u64;
    while !pending.is_empty() {
        let batch = rt.drain_wait(64, Duration::from_millis(250));
        if batch.is_empty() {
            let (queued, inflight) = rt.queue_debug_counts();
            if queued == 0 && inflight == 0 {
                log::warn!("{} chunks never came back", pending.len());
                break;
            }
            continue;
        }
        for res in batch {
            pending.remove(&res.coord);
            tris += res.mesh.triangle_count();
            verts += res.mesh.vertex_count();
            retries += usize::from(res.mesh.retry);
            mesh_ms_sum += u64::from(res.t_mesh_ms);
        }
    }
    let secs = t0.elapsed().as_secs_f64();
    let done = map.len() - pending.len();
    log::info!(
        target: "perf",
        "ms={:.1} bench_world chunks={} workers={} kind={:?} lod={} chunks_per_s={:.1} \
         tris={} verts={} retries={} mesh_ms_sum={}",
        secs * 1000.0,
        done,
        rt.workers(),
        cfg.kind,
        cfg.lod,
        done as f64 / secs.max(1e-9),
        tris,
        verts,
        retries,
        mesh_ms_sum
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Mesh(args) => run_mesh(args),
        Command::Dump(args) => run_dump(args),
        Command::BenchWorld(args) => run_bench_world(args),
    }
}
