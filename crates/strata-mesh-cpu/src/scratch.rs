//! Per-thread reusable working buffers.
//!
//! A meshing call takes the thread's scratch out of its slot and puts it back when
//! done, so concurrent calls on different threads never share buffers and a nested
//! call on the same thread simply starts from an empty set.

use std::cell::RefCell;

use hashbrown::HashMap;
use strata_blocks::BlockId;

use crate::marching::EdgeKey;

#[derive(Default)]
pub struct Scratch {
    /// Greedy mask: block id and face sign per plane cell; id 0 = empty.
    pub mask: Vec<(BlockId, i8)>,
    pub frozen: Vec<bool>,
    pub cells: Vec<BlockId>,
    pub window: Vec<BlockId>,
    pub edge_cache: HashMap<EdgeKey, u32>,
    pub cell_verts: Vec<u32>,
}

thread_local! {
    static SCRATCH: RefCell<Scratch> = RefCell::new(Scratch::default());
    static LAST_MESH_RESERVE: RefCell<[usize; 2]> = const { RefCell::new([64, 64]) };
}

/// Runs `f` with this thread's scratch buffers.
pub fn with_scratch<R>(f: impl FnOnce(&mut Scratch) -> R) -> R {
    let mut s = SCRATCH.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    let out = f(&mut s);
    s.edge_cache.clear();
    SCRATCH.with(|cell| *cell.borrow_mut() = s);
    out
}

/// Quad reserve hint per layer from the last chunk meshed on this thread.
pub(crate) fn last_mesh_reserve() -> [usize; 2] {
    LAST_MESH_RESERVE.with(|cell| *cell.borrow())
}

pub(crate) fn update_last_mesh_reserve(quads: [usize; 2]) {
    LAST_MESH_RESERVE.with(|cell| {
        let mut caps = cell.borrow_mut();
        for (cap, q) in caps.iter_mut().zip(quads) {
            *cap = q + q / 4 + 64;
        }
    });
}
