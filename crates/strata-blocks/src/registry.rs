use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::atlas::AtlasUvTable;
use super::config::{BlockEntry, BlocksConfig};
use super::transparency::TransparencySet;
use super::types::{BlockId, BlockUvs, TileCoord};

/// Fallback tint when a block carries no color.
pub const DEFAULT_COLOR: [u8; 3] = [115, 60, 20];

#[derive(Clone, Debug)]
pub struct BlockDef {
    pub id: BlockId,
    pub name: String,
    pub uvs: BlockUvs,
    pub transparent: bool,
    pub color: Option<[u8; 3]>,
    pub emission: u8,
}

/// Everything the meshers and the light pass need to know about block ids.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub atlas: AtlasUvTable,
    pub transparent: TransparencySet,
    defs: Vec<Option<BlockDef>>,
    by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new(16)
    }
}

impl BlockRegistry {
    /// Empty registry: every id uses the fallback tiles, nothing is transparent.
    pub fn new(tiles_per_side: u16) -> Self {
        Self {
            atlas: AtlasUvTable::new(tiles_per_side),
            transparent: TransparencySet::new(),
            defs: vec![None; 256],
            by_name: HashMap::new(),
        }
    }

    /// Registers or replaces a block definition.
    pub fn insert(&mut self, def: BlockDef) {
        let id = def.id;
        if let Some(old) = self.defs[id as usize].take() {
            self.by_name.remove(&old.name);
        }
        self.atlas.set(id, def.uvs);
        if def.transparent {
            self.transparent.insert(id);
        } else {
            self.transparent.remove(id);
        }
        self.by_name.insert(def.name.clone(), id);
        self.defs[id as usize] = Some(def);
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.defs[id as usize].as_ref()
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.transparent.contains(id)
    }

    /// Base tint, [`DEFAULT_COLOR`] for unknown or uncolored ids.
    #[inline]
    pub fn color(&self, id: BlockId) -> [u8; 3] {
        self.get(id).and_then(|d| d.color).unwrap_or(DEFAULT_COLOR)
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.get(id).map(|d| d.emission).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.defs.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter().filter_map(|d| d.as_ref())
    }

    /// The stock block set and its 16x16 atlas layout.
    pub fn builtin() -> Self {
        let mut reg = BlockRegistry::new(16);
        let top_side = BlockUvs::top_side;
        let uni = BlockUvs::uniform;
        let table: &[(BlockId, &str, BlockUvs, Option<[u8; 3]>)] = &[
            (1, "grass", BlockUvs::FALLBACK, Some([60, 180, 75])),
            (2, "stone", uni(1, 15), Some([128, 128, 128])),
            (3, "cobblestone", uni(0, 14), Some([110, 110, 110])),
            (4, "dirt", uni(2, 15), Some([115, 60, 20])),
            (5, "torch", uni(1, 1), None),
            (6, "lamp", uni(2, 13), None),
            (7, "bricks", uni(4, 2), None),
            (8, "birch_log", top_side(5, 14, 4, 14), None),
            (9, "log", top_side(5, 14, 4, 14), Some([102, 76, 51])),
            (10, "leaves", uni(5, 12), Some([40, 140, 40])),
            (11, "planks", uni(4, 15), Some([160, 130, 80])),
            (12, "blue_wool", uni(2, 4), None),
            (14, "old_stone", uni(8, 3), None),
            (15, "snow", uni(2, 11), Some([240, 240, 250])),
            (30, "iron_ore", uni(1, 13), None),
            (31, "saltpeter", uni(15, 1), None),
            (32, "sulfur", uni(15, 2), None),
            (36, "gravel", uni(3, 14), Some([130, 125, 120])),
            (61, "cliff_road", uni(8, 2), None),
            (62, "cobblestone_wall", uni(7, 1), None),
            (63, "wall_cliff", uni(8, 1), None),
            (64, "cobblestone_road", uni(9, 1), None),
            (66, "tile_66", uni(0, 1), None),
            (88, "engine", uni(2, 14), None),
            (90, "sand", uni(2, 14), Some([220, 205, 150])),
            (91, "actuator_rotary", uni(5, 1), None),
            (92, "wood_plank", uni(12, 4), None),
            (94, "interwoven_stone", uni(9, 2), None),
            (100, "simple_workbench", uni(15, 0), None),
            (101, "workbench", uni(11, 13), None),
            (102, "furnace", top_side(14, 12, 12, 13), None),
        ];
        for (id, name, uvs, color) in table {
            let emission = match *id {
                5 => 14,
                6 => 15,
                _ => 0,
            };
            reg.insert(BlockDef {
                id: *id,
                name: (*name).to_string(),
                uvs: *uvs,
                transparent: *id == 10,
                color: *color,
                emission,
            });
        }
        reg
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        if cfg.tiles_per_side == 0 {
            return Err("tiles_per_side must be at least 1".into());
        }
        let mut reg = BlockRegistry::new(cfg.tiles_per_side);
        for entry in cfg.blocks {
            if entry.id == 0 {
                return Err(format!("block '{}' uses reserved id 0 (air)", entry.name).into());
            }
            if reg.get(entry.id).is_some() {
                return Err(format!("duplicate block id {}", entry.id).into());
            }
            if reg.id_by_name(&entry.name).is_some() {
                return Err(format!("duplicate block name '{}'", entry.name).into());
            }
            let def = resolve_entry(entry);
            reg.insert(def);
        }
        Ok(reg)
    }
}

fn resolve_entry(e: BlockEntry) -> BlockDef {
    let tc = |t: [u8; 2]| TileCoord::new(t[0], t[1]);
    let base = e.tile.map(tc);
    let top = e.top.map(tc).or(base).unwrap_or(BlockUvs::FALLBACK.top);
    let side = e.side.map(tc).or(base).unwrap_or(BlockUvs::FALLBACK.side);
    let bottom = e
        .bottom
        .map(tc)
        .or(base)
        .or(e.top.map(tc))
        .unwrap_or(BlockUvs::FALLBACK.bottom);
    BlockDef {
        id: e.id,
        name: e.name,
        uvs: BlockUvs::new(top, side, bottom),
        transparent: e.transparent.unwrap_or(false),
        color: e.color,
        emission: e.emission.unwrap_or(0).min(15),
    }
}
