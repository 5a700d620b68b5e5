use serde::Deserialize;

/// Top-level `blocks.toml` document.
#[derive(Deserialize, Clone, Debug)]
pub struct BlocksConfig {
    #[serde(default = "default_tiles_per_side")]
    pub tiles_per_side: u16,
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
}

fn default_tiles_per_side() -> u16 {
    16
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            tiles_per_side: default_tiles_per_side(),
            blocks: Vec::new(),
        }
    }
}

/// One `[[blocks]]` table.
///
/// `tile` sets every face; `top`, `side`, `bottom` override it per face.
/// When only `top` is given it also covers the bottom.
#[derive(Deserialize, Clone, Debug)]
pub struct BlockEntry {
    pub id: u8,
    pub name: String,
    pub tile: Option<[u8; 2]>,
    pub top: Option<[u8; 2]>,
    pub side: Option<[u8; 2]>,
    pub bottom: Option<[u8; 2]>,
    pub transparent: Option<bool>,
    pub color: Option<[u8; 3]>,
    pub emission: Option<u8>,
}
