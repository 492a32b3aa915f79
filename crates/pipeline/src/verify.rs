use log::{info, warn};
use shardline_input::Record;
use shardline_store::ShardConnection;

use crate::{error::ShardError, pool::ShardPool, resolver::resolve};

/// Rows read back from one shard, or why they could not be.
#[derive(Debug)]
pub struct ShardContents {
    pub shard: usize,
    pub rows: Result<Vec<Record>, ShardError>,
}

impl ShardContents {
    /// `None` when the shard could not be read.
    pub fn row_count(&self) -> Option<usize> {
        self.rows.as_ref().ok().map(Vec::len)
    }
}

/// Per-shard contents, indexed by shard.
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub shards: Vec<ShardContents>,
}

impl VerifyReport {
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Rows of `shard`, if it was read successfully.
    pub fn rows(&self, shard: usize) -> Option<&[Record]> {
        self.shards
            .get(shard)
            .and_then(|c| c.rows.as_ref().ok())
            .map(Vec::as_slice)
    }

    /// Rows across every shard that could be read.
    pub fn total_rows(&self) -> usize {
        self.shards.iter().filter_map(ShardContents::row_count).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ShardError> {
        self.shards.iter().filter_map(|c| c.rows.as_ref().err())
    }

    /// True when every shard was read.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Rows sitting in a shard their key does not resolve to, as `(shard, row)`.
    pub fn misrouted(&self) -> Vec<(usize, &Record)> {
        let n = self.shards.len();
        self.shards
            .iter()
            .filter_map(|c| c.rows.as_ref().ok().map(|rows| (c.shard, rows)))
            .flat_map(|(shard, rows)| rows.iter().map(move |r| (shard, r)))
            .filter(|(shard, r)| resolve(&r.partition_key, n) != *shard)
            .collect()
    }
}

/// Read every shard in the pool back, in shard order.
///
/// A failed read is recorded for that shard and the remaining shards are
/// still read.
pub fn verify<C: ShardConnection>(pool: &mut ShardPool<C>) -> VerifyReport {
    let mut report = VerifyReport {
        shards: Vec::with_capacity(pool.len()),
    };

    for (shard, conn) in pool.connections_mut().iter_mut().enumerate() {
        let rows = conn
            .read_all()
            .map_err(|source| ShardError::Read { shard, source });

        match &rows {
            Ok(rows) if rows.is_empty() => info!("shard {shard}: no data"),
            Ok(rows) => info!("shard {shard}: {} rows", rows.len()),
            Err(e) => warn!("{e}"),
        }

        report.shards.push(ShardContents { shard, rows });
    }

    report
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
