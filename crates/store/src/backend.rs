use shardline_input::Record;

use crate::error::BackendError;

/// One open connection to a shard's storage.
///
/// Connections are moved onto writer threads in parallel mode, hence `Send`.
pub trait ShardConnection: Send {
    /// Run schema DDL against the shard.
    fn create_schema(&mut self, ddl: &str) -> Result<(), BackendError>;

    /// Write `rows` as one batched operation: either every row is stored or none is.
    fn write_batch(&mut self, rows: &[Record]) -> Result<usize, BackendError>;

    /// Every stored row, in write order.
    fn read_all(&mut self) -> Result<Vec<Record>, BackendError>;

    fn close(self) -> Result<(), BackendError>;
}

/// Opens connections to shards by index.
pub trait ShardBackend {
    type Connection: ShardConnection;

    fn connect(&self, shard: usize) -> Result<Self::Connection, BackendError>;

    /// Human readable location of a shard, for logs.
    fn describe(&self, shard: usize) -> String {
        format!("shard {shard}")
    }
}
