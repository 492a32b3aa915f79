use shardline_runtime::{DEFAULT_BATCH_SIZE, DEFAULT_SHARD_COUNT};
use shardline_store::CREATE_TABLE_SQL;

use crate::error::PipelineError;

/// Rows queued per shard worker in parallel mode before the dispatcher blocks.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// How a failed batched write affects the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteErrorPolicy {
    /// First failed write ends the run.
    #[default]
    Abort,
    /// Log the failure, drop that batch and keep loading.
    Continue,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub shard_count: usize,
    pub batch_size: usize,
    /// DDL run against every shard during initialization.
    pub schema_ddl: String,
    pub write_errors: WriteErrorPolicy,
    /// One writer thread per shard instead of a single dispatch loop.
    pub parallel: bool,
    pub channel_capacity: usize,
    /// Read every shard back once draining completes.
    pub verify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            schema_ddl: CREATE_TABLE_SQL.to_owned(),
            write_errors: WriteErrorPolicy::Abort,
            parallel: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            verify: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let checks = [
            (self.shard_count, "shard count"),
            (self.batch_size, "batch size"),
            (self.channel_capacity, "channel capacity"),
        ];

        for (value, name) in checks {
            if value == 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be positive"
                )));
            }
        }

        if self.schema_ddl.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("schema DDL is empty".into()));
        }

        Ok(())
    }
}
