mod config;
mod error;
mod ingest;
mod parallel;
mod pool;
mod resolver;
mod verify;
mod writer;

#[cfg(test)]
mod testing;

pub use config::{PipelineConfig, WriteErrorPolicy};
pub use error::{Phase, PipelineError, RunError, ShardError};
pub use ingest::{IngestPipeline, RunReport, RunState};
pub use pool::ShardPool;
pub use resolver::{key_hash, resolve};
pub use verify::{ShardContents, VerifyReport, verify};
pub use writer::{BatchWriter, WriterStats};
