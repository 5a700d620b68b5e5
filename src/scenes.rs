//! Synthetic block fields used by the CLI to exercise the meshers.

use std::sync::Arc;

use clap::ValueEnum;
use strata_blocks::BlockId;
use strata_runtime::SharedWorld;

const GRASS: BlockId = 1;
const STONE: BlockId = 2;
const DIRT: BlockId = 4;
const LEAVES: BlockId = 10;
const SNOW: BlockId = 15;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scene {
    /// Layered slab with its grass top at y = 5.
    Flat,
    /// Solid stone ball centered in chunk (0, 0, 0).
    Sphere,
    /// Sine height field with snow caps and a few leaf blobs.
    Waves,
    /// A CSV chunk dump given by `--input`.
    File,
}

impl Scene {
    pub fn is_synthetic(self) -> bool {
        !matches!(self, Scene::File)
    }
}

pub fn flat(_x: i32, y: i32, _z: i32) -> BlockId {
    match y {
        i32::MIN..=2 => STONE,
        3..=4 => DIRT,
        5 => GRASS,
        _ => 0,
    }
}

pub fn sphere(x: i32, y: i32, z: i32) -> BlockId {
    let (dx, dy, dz) = (x as f32 - 7.5, y as f32 - 7.5, z as f32 - 7.5);
    if dx * dx + dy * dy + dz * dz <= 6.5 * 6.5 {
        STONE
    } else {
        0
    }
}

pub fn wave_height(x: i32, z: i32) -> i32 {
    let h = 8.0 + 3.0 * (x as f32 * 0.3).sin() + 2.0 * (z as f32 * 0.25).cos();
    h.floor() as i32
}

pub fn waves(x: i32, y: i32, z: i32) -> BlockId {
    let h = wave_height(x, z);
    if y > h {
        // Sparse canopy one block above the crests.
        if y == h + 1 && h >= 10 && (x * 7 + z * 13).rem_euclid(11) == 0 {
            return LEAVES;
        }
        return 0;
    }
    if y == h {
        if h >= 11 { SNOW } else { GRASS }
    } else if y >= h - 2 {
        DIRT
    } else {
        STONE
    }
}

/// World sampler for a synthetic scene; `None` for [`Scene::File`].
pub fn sampler(scene: Scene) -> Option<SharedWorld> {
    let world: SharedWorld = match scene {
        Scene::Flat => Arc::new(flat),
        Scene::Sphere => Arc::new(sphere),
        Scene::Waves => Arc::new(waves),
        Scene::File => return None,
    };
    Some(world)
}
