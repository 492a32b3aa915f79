use std::fmt;

use shardline_input::InputError;
use shardline_store::BackendError;
use thiserror::Error;

/// Failure tied to one shard. Every variant names the shard index.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("shard {shard}: connection failed: {source}")]
    Connection { shard: usize, source: BackendError },

    #[error("shard {shard}: schema creation failed: {source}")]
    Schema { shard: usize, source: BackendError },

    #[error("shard {shard}: batched write of {rows} rows failed: {source}")]
    Write {
        shard: usize,
        rows: usize,
        source: BackendError,
    },

    #[error("shard {shard}: read failed: {source}")]
    Read { shard: usize, source: BackendError },

    #[error("shard {shard}: close failed: {source}")]
    Close { shard: usize, source: BackendError },

    #[error("shard {shard} out of range, pool holds {len}")]
    OutOfRange { shard: usize, len: usize },

    #[error("shard {shard}: pool not initialized")]
    NotInitialized { shard: usize },

    #[error("shard pool already holds {len} connections")]
    AlreadyInitialized { len: usize },
}

impl ShardError {
    pub fn shard(&self) -> Option<usize> {
        match self {
            ShardError::Connection { shard, .. }
            | ShardError::Schema { shard, .. }
            | ShardError::Write { shard, .. }
            | ShardError::Read { shard, .. }
            | ShardError::Close { shard, .. }
            | ShardError::OutOfRange { shard, .. }
            | ShardError::NotInitialized { shard } => Some(*shard),
            ShardError::AlreadyInitialized { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Shard(#[from] ShardError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{failed} shard connection(s) failed to close")]
    Cleanup { failed: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("writer thread for shard {0} panicked")]
    WorkerPanicked(usize),

    #[error("pipeline has already run")]
    AlreadyRan,
}

impl PipelineError {
    pub fn shard(&self) -> Option<usize> {
        match self {
            PipelineError::Shard(e) => e.shard(),
            PipelineError::WorkerPanicked(shard) => Some(*shard),
            _ => None,
        }
    }
}

/// Pipeline phase an error surfaced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialize,
    Stream,
    Drain,
    Verify,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initialize => "initialize",
            Phase::Stream => "stream",
            Phase::Drain => "drain",
            Phase::Verify => "verify",
            Phase::Close => "close",
        };
        f.write_str(name)
    }
}

/// Top-level failure of a run.
///
/// `cleanup` carries every close failure collected while releasing the
/// shards, whatever phase the run failed in.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct RunError {
    pub phase: Phase,
    pub source: PipelineError,
    pub cleanup: Vec<ShardError>,
    /// Rows each shard committed before the failure. Flushed batches stay
    /// in storage, so this is what the shards hold. Empty when the run never
    /// started.
    pub written: Vec<usize>,
}

impl RunError {
    pub fn new(phase: Phase, source: impl Into<PipelineError>) -> Self {
        Self {
            phase,
            source: source.into(),
            cleanup: Vec::new(),
            written: Vec::new(),
        }
    }

    pub fn shard(&self) -> Option<usize> {
        self.source.shard()
    }
}
