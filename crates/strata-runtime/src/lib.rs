//! Background chunk meshing: a rayon worker pool feeding a single consumer.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use hashbrown::HashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_blocks::BlockRegistry;
use strata_chunk::{BlockSampler, ChunkBuf, ChunkCoord};
use strata_lighting::{LightGrid, compute_chunk_lightmap};
use strata_mesh_cpu::{ChunkMesh, MeshOptions, MesherConfig, generate_chunk_mesh_or_empty};

/// Read-only world snapshot shared by every job of one tick.
pub type SharedWorld = Arc<dyn BlockSampler + Send + Sync>;

#[derive(Clone)]
pub struct MeshJob {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub buf: ChunkBuf,
    pub world: SharedWorld,
    pub reg: Arc<BlockRegistry>,
    pub config: Arc<MesherConfig>,
    /// Compute a lightmap for the chunk on the worker and shade with it.
    pub with_light: bool,
}

pub struct MeshResult {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub mesh: ChunkMesh,
    pub light_grid: Option<LightGrid>,
    pub t_total_ms: u32,
    pub t_light_ms: u32,
    pub t_mesh_ms: u32,
}

#[inline]
fn ms_since(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn process_mesh_job(job: MeshJob, tx: &Sender<MeshResult>) {
    let MeshJob {
        coord,
        rev,
        buf,
        world,
        reg,
        config,
        with_light,
    } = job;

    let t_job_start = Instant::now();
    let mut t_light_ms: u32 = 0;

    let light_grid = if with_light {
        let t0 = Instant::now();
        let lg = compute_chunk_lightmap(&buf, world.as_ref(), &reg);
        t_light_ms = ms_since(t0);
        Some(lg)
    } else {
        None
    };

    let t0 = Instant::now();
    let mut opts = MeshOptions::new(config.as_ref());
    if let Some(lg) = light_grid.as_ref() {
        opts = opts.with_light(lg);
    }
    let mesh = generate_chunk_mesh_or_empty(&buf, world.as_ref(), &reg, &opts);
    let t_mesh_ms = ms_since(t0);

    let _ = tx.send(MeshResult {
        coord,
        rev,
        mesh,
        light_grid,
        t_total_ms: ms_since(t_job_start),
        t_light_ms,
        t_mesh_ms,
    });
}

/// Meshes chunks on a fixed worker pool and hands results back in completion order.
///
/// Only the newest submitted revision of a chunk is ever delivered; older results are
/// dropped on drain.
pub struct MeshRuntime {
    job_tx: Sender<MeshJob>,
    res_rx: Receiver<MeshResult>,
    _pool: Arc<ThreadPool>,
    latest_rev: HashMap<ChunkCoord, u64>,
    q_jobs: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    workers: usize,
    discarded: u64,
}

impl MeshRuntime {
    /// Starts a runtime with one worker per available core.
    pub fn new() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        Self::with_workers(workers)
    }

    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<MeshJob>();
        let (res_tx, res_rx) = unbounded::<MeshResult>();
        let q_jobs = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-mesh-{i}"))
            .build()
            .expect("mesh pool");
        let workers = pool.current_num_threads();
        let pool = Arc::new(pool);

        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let q = q_jobs.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    inflight.fetch_add(1, Ordering::Relaxed);
                    q.fetch_sub(1, Ordering::Relaxed);
                    process_mesh_job(job, &tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }
        log::info!("mesh runtime started with {} workers", workers);

        Self {
            job_tx,
            res_rx,
            _pool: pool,
            latest_rev: HashMap::new(),
            q_jobs,
            inflight,
            workers,
            discarded: 0,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queues `job`. It becomes the newest revision of its chunk unless a later
    /// one was already submitted.
    pub fn submit(&mut self, job: MeshJob) {
        let rev = self.latest_rev.entry(job.coord).or_insert(job.rev);
        if job.rev > *rev {
            *rev = job.rev;
        }
        self.q_jobs.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.q_jobs.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Stops tracking `coord`; any result still in flight for it is discarded.
    pub fn forget(&mut self, coord: ChunkCoord) {
        self.latest_rev.remove(&coord);
    }

    /// Returns up to `max` finished results without blocking.
    pub fn drain(&mut self, max: usize) -> Vec<MeshResult> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.res_rx.try_recv() {
                Ok(res) => self.accept(res, &mut out),
                Err(_) => break,
            }
        }
        out
    }

    /// Like [`drain`](Self::drain), but waits up to `timeout` for the first result.
    pub fn drain_wait(&mut self, max: usize, timeout: Duration) -> Vec<MeshResult> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::new();
        while out.is_empty() && max > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.res_rx.recv_timeout(left) {
                Ok(res) => self.accept(res, &mut out),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return out;
                }
            }
        }
        out.extend(self.drain(max.saturating_sub(out.len())));
        out
    }

    fn accept(&mut self, res: MeshResult, out: &mut Vec<MeshResult>) {
        match self.latest_rev.get(&res.coord) {
            Some(&latest) if res.rev >= latest => {
                log::debug!(
                    target: "perf",
                    "ms={} mesh_job coord=({},{},{}) rev={} light_ms={} mesh_ms={} verts={}",
                    res.t_total_ms,
                    res.coord.cx,
                    res.coord.cy,
                    res.coord.cz,
                    res.rev,
                    res.t_light_ms,
                    res.t_mesh_ms,
                    res.mesh.vertex_count()
                );
                out.push(res);
            }
            _ => {
                self.discarded += 1;
                log::trace!("dropping stale mesh for {:?} rev {}", res.coord, res.rev);
            }
        }
    }

    /// Number of stale results dropped so far.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// (queued, in flight)
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.q_jobs.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}

impl Default for MeshRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::ChunkMap;
    use strata_mesh_cpu::{MesherKind, validate};

    const N: usize = 16;

    fn hills() -> ChunkMap {
        let mut map = ChunkMap::new(N);
        for cx in -1..=1 {
            for cz in -1..=1 {
                let coord = ChunkCoord::new(cx, 0, cz);
                let buf = ChunkBuf::from_sampler(coord, N, &|x: i32, y: i32, z: i32| {
                    let h = 6 + ((x + z).rem_euclid(5));
                    if y <= h { 2u8 } else { 0u8 }
                });
                map.insert(buf).unwrap();
            }
        }
        map
    }

    fn job(map: &Arc<ChunkMap>, coord: ChunkCoord, rev: u64, kind: MesherKind) -> MeshJob {
        let config = MesherConfig {
            kind,
            ..MesherConfig::default()
        };
        MeshJob {
            coord,
            rev,
            buf: map.get(coord).unwrap().clone(),
            world: map.clone(),
            reg: Arc::new(BlockRegistry::builtin()),
            config: Arc::new(config),
            with_light: false,
        }
    }

    fn collect(rt: &mut MeshRuntime, want: usize) -> Vec<MeshResult> {
        let mut out = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(30);
        while out.len() < want && Instant::now() < deadline {
            out.extend(rt.drain_wait(want - out.len(), Duration::from_millis(200)));
        }
        out
    }

    #[test]
    fn meshes_every_submitted_chunk() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(3);
        let coords: Vec<ChunkCoord> = map.coords().collect();
        for &c in &coords {
            rt.submit(job(&map, c, 1, MesherKind::Greedy));
        }
        let out = collect(&mut rt, coords.len());
        assert_eq!(out.len(), coords.len());
        for r in &out {
            assert!(!r.mesh.is_empty());
            assert!(!r.mesh.retry);
            assert!(validate(&r.mesh).is_ok());
            assert_eq!(r.mesh.coord, r.coord);
        }
    }

    #[test]
    fn drain_respects_max() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(2);
        let coords: Vec<ChunkCoord> = map.coords().collect();
        for &c in &coords {
            rt.submit(job(&map, c, 1, MesherKind::Naive));
        }
        let deadline = Instant::now() + Duration::from_secs(30);
        while rt.queue_debug_counts() != (0, 0) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(20));
        let first = rt.drain(4);
        assert!(first.len() <= 4);
        let rest = collect(&mut rt, coords.len() - first.len());
        assert_eq!(first.len() + rest.len(), coords.len());
    }

    #[test]
    fn stale_revisions_are_dropped() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(2);
        let c = ChunkCoord::new(0, 0, 0);
        rt.submit(job(&map, c, 1, MesherKind::Greedy));
        rt.submit(job(&map, c, 2, MesherKind::MarchingCubes));
        let out = collect(&mut rt, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rev, 2);

        let deadline = Instant::now() + Duration::from_secs(30);
        while rt.queue_debug_counts() != (0, 0) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(20));
        assert!(rt.drain(8).is_empty());
        assert_eq!(rt.discarded(), 1);
    }

    #[test]
    fn forgotten_chunks_are_dropped() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(1);
        let c = ChunkCoord::new(1, 0, 1);
        rt.submit(job(&map, c, 7, MesherKind::Greedy));
        rt.forget(c);
        let out = rt.drain_wait(1, Duration::from_secs(2));
        assert!(out.is_empty());
    }

    #[test]
    fn failed_jobs_come_back_empty_with_retry() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(1);
        let c = ChunkCoord::new(0, 0, 0);
        let mut bad = job(&map, c, 3, MesherKind::Greedy);
        bad.buf = ChunkBuf::new_air(c, N, N / 2, N);
        rt.submit(bad);
        let out = collect(&mut rt, 1);
        assert_eq!(out.len(), 1);
        assert!(out[0].mesh.retry);
        assert!(out[0].mesh.is_empty());
    }

    #[test]
    fn light_jobs_return_their_lightmap() {
        let map = Arc::new(hills());
        let mut rt = MeshRuntime::with_workers(1);
        let c = ChunkCoord::new(0, 0, 0);
        let mut j = job(&map, c, 1, MesherKind::Greedy);
        j.with_light = true;
        rt.submit(j);
        let out = collect(&mut rt, 1);
        assert_eq!(out.len(), 1);
        assert!(out[0].light_grid.is_some());
        assert!(out[0].mesh.colors.is_some());
    }
}
