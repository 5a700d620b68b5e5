use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("block array holds {got} cells, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("chunk dimension must be positive, got {0}")]
    InvalidSize(usize),
    #[error("cannot parse block id at index {index}: {token:?}")]
    Parse { index: usize, token: String },
}
