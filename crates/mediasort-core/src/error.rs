use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortError {
    /// Fatal: raised before any copy when the destination cannot hold the
    /// whole batch.
    #[error("insufficient space at {destination}: {required} bytes needed, {available} available")]
    InsufficientSpace {
        destination: PathBuf,
        required: u64,
        available: u64,
    },

    /// Per-file: no free collision suffix within the search bound.
    #[error("no free name for {name} in {dir} after {limit} suffixes")]
    CollisionExhausted {
        dir: PathBuf,
        name: String,
        limit: u32,
    },

    #[error("record store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("corrupt migration record: {0}")]
    CorruptRecord(String),
}
