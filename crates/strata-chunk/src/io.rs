//! Comma-separated chunk dumps: x varies fastest, then y, then z.

use std::fmt::Write as _;

use strata_blocks::BlockId;

use crate::{ChunkBuf, ChunkCoord, ChunkError};

pub fn chunk_to_csv(buf: &ChunkBuf) -> String {
    let mut out = String::with_capacity(buf.blocks.len() * 2);
    let mut first = true;
    for z in 0..buf.sz {
        for y in 0..buf.sy {
            for x in 0..buf.sx {
                if !first {
                    out.push(',');
                }
                first = false;
                let _ = write!(out, "{}", buf.get_local(x, y, z));
            }
        }
    }
    out
}

/// Parses a dump produced by [`chunk_to_csv`]. Whitespace around tokens is ignored.
pub fn chunk_from_csv(
    coord: ChunkCoord,
    sx: usize,
    sy: usize,
    sz: usize,
    text: &str,
) -> Result<ChunkBuf, ChunkError> {
    let trimmed = text.trim();
    let mut ids: Vec<BlockId> = Vec::with_capacity(sx * sy * sz);
    if !trimmed.is_empty() {
        for (index, tok) in trimmed.split(',').enumerate() {
            let tok = tok.trim();
            let id = tok.parse::<BlockId>().map_err(|_| ChunkError::Parse {
                index,
                token: tok.to_string(),
            })?;
            ids.push(id);
        }
    }
    let expected = sx * sy * sz;
    if ids.len() != expected {
        return Err(ChunkError::ShapeMismatch {
            expected,
            got: ids.len(),
        });
    }
    let mut buf = ChunkBuf::from_blocks(coord, sx, sy, sz, vec![0; expected])?;
    let mut it = ids.into_iter();
    for z in 0..sz {
        for y in 0..sy {
            for x in 0..sx {
                if let Some(id) = it.next() {
                    buf.set_local(x, y, z, id);
                }
            }
        }
    }
    Ok(buf)
}
