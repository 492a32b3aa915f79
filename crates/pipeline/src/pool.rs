use log::{debug, info, warn};
use shardline_store::{ShardBackend, ShardConnection};

use crate::error::ShardError;

/// Owns one open connection per shard, indexed `0..len`.
///
/// Connections are only added by [`ShardPool::initialize_all`] or
/// [`ShardPool::open_all`] and only removed by [`ShardPool::close_all`]. A pool
/// dropped while still holding connections closes them and logs any failure.
pub struct ShardPool<C: ShardConnection> {
    connections: Vec<C>,
}

impl<C: ShardConnection> Default for ShardPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ShardConnection> ShardPool<C> {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
        }
    }

    /// Open shards `0..shard_count` and run `ddl` on each, stopping at the
    /// first failure.
    ///
    /// Shards opened before the failure, including one whose schema step
    /// failed, stay in the pool so that [`ShardPool::close_all`] releases them.
    pub fn initialize_all<B>(
        &mut self,
        backend: &B,
        shard_count: usize,
        ddl: &str,
    ) -> Result<(), ShardError>
    where
        B: ShardBackend<Connection = C>,
    {
        info!("Initializing {shard_count} shards");
        self.connect_all(backend, shard_count, Some(ddl))?;
        info!("All shards initialized");
        Ok(())
    }

    /// Open shards `0..shard_count` without touching their schema.
    pub fn open_all<B>(&mut self, backend: &B, shard_count: usize) -> Result<(), ShardError>
    where
        B: ShardBackend<Connection = C>,
    {
        self.connect_all(backend, shard_count, None)
    }

    fn connect_all<B>(
        &mut self,
        backend: &B,
        shard_count: usize,
        ddl: Option<&str>,
    ) -> Result<(), ShardError>
    where
        B: ShardBackend<Connection = C>,
    {
        if !self.connections.is_empty() {
            return Err(ShardError::AlreadyInitialized {
                len: self.connections.len(),
            });
        }

        self.connections.reserve(shard_count);
        for shard in 0..shard_count {
            let conn = backend
                .connect(shard)
                .map_err(|source| ShardError::Connection { shard, source })?;
            self.connections.push(conn);

            if let Some(ddl) = ddl {
                self.connections[shard]
                    .create_schema(ddl)
                    .map_err(|source| ShardError::Schema { shard, source })?;
            }
            debug!("[pool] {} ready", backend.describe(shard));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get_mut(&mut self, shard: usize) -> Result<&mut C, ShardError> {
        let len = self.connections.len();
        if len == 0 {
            return Err(ShardError::NotInitialized { shard });
        }
        self.connections
            .get_mut(shard)
            .ok_or(ShardError::OutOfRange { shard, len })
    }

    /// Every connection, indexed by shard. Used to hand each shard to its own worker.
    pub fn connections_mut(&mut self) -> &mut [C] {
        &mut self.connections
    }

    /// Close every held connection, attempting all of them even when some fail.
    ///
    /// Returns the failures in shard order; the pool is empty afterwards.
    pub fn close_all(&mut self) -> Vec<ShardError> {
        if self.connections.is_empty() {
            return Vec::new();
        }

        info!("Closing {} shard connections", self.connections.len());
        let mut errors = Vec::new();
        for (shard, conn) in self.connections.drain(..).enumerate() {
            if let Err(source) = conn.close() {
                let err = ShardError::Close { shard, source };
                warn!("[pool] {err}");
                errors.push(err);
            }
        }
        errors
    }
}

impl<C: ShardConnection> Drop for ShardPool<C> {
    fn drop(&mut self) {
        if !self.connections.is_empty() {
            warn!("[pool] dropped with open connections, closing them");
            // Failures are already logged by close_all.
            let _ = self.close_all();
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
