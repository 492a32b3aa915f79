use log::debug;
use shardline_input::Record;
use shardline_store::ShardConnection;

use crate::error::ShardError;

/// Counters kept by a [`BatchWriter`] over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Rows accepted through `add`.
    pub rows_added: usize,
    /// Rows the shard confirmed as written.
    pub rows_written: usize,
    /// Successful non-empty flushes, implicit or explicit.
    pub flushes: usize,
    /// Flushes triggered by the buffer reaching the batch size.
    pub implicit_flushes: usize,
    /// Rows thrown away by [`BatchWriter::discard`].
    pub rows_dropped: usize,
}

/// Buffer of rows bound for one shard.
///
/// Rows are written in the order they were added. A failed flush leaves the
/// buffer untouched; the caller decides whether to retry or discard it.
#[derive(Debug)]
pub struct BatchWriter {
    shard: usize,
    batch_size: usize,
    buffer: Vec<Record>,
    stats: WriterStats,
}

impl BatchWriter {
    pub fn new(shard: usize, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            shard,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            stats: WriterStats::default(),
        }
    }

    pub fn shard(&self) -> usize {
        self.shard
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Buffer `record`, flushing once the buffer reaches the batch size.
    ///
    /// Returns the number of rows written by that implicit flush, `0` when
    /// none happened.
    pub fn add<C: ShardConnection>(
        &mut self,
        record: Record,
        conn: &mut C,
    ) -> Result<usize, ShardError> {
        self.buffer.push(record);
        self.stats.rows_added += 1;

        if self.buffer.len() < self.batch_size {
            return Ok(0);
        }

        let written = self.flush(conn)?;
        self.stats.implicit_flushes += 1;
        Ok(written)
    }

    /// Send every buffered row to the shard as one batched write.
    pub fn flush<C: ShardConnection>(&mut self, conn: &mut C) -> Result<usize, ShardError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let rows = self.buffer.len();
        let written = conn
            .write_batch(&self.buffer)
            .map_err(|source| ShardError::Write {
                shard: self.shard,
                rows,
                source,
            })?;

        self.buffer.clear();
        self.stats.rows_written += written;
        self.stats.flushes += 1;
        debug!("[writer] shard {} flushed {written} rows", self.shard);
        Ok(written)
    }

    /// Final flush at end of input.
    pub fn drain<C: ShardConnection>(&mut self, conn: &mut C) -> Result<usize, ShardError> {
        self.flush(conn)
    }

    /// Drop whatever is buffered, returning how many rows were lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.stats.rows_dropped += dropped;
        dropped
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
