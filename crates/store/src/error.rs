use thiserror::Error;

/// Failure reported by a storage backend for a single shard connection.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no connection target for shard {0}")]
    MissingTarget(usize),

    #[error("invalid connection target {0:?}")]
    InvalidTarget(String),

    #[error("{0}")]
    Other(String),
}
