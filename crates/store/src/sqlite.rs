use std::{fs, path::Path};

use log::debug;
use rusqlite::{Connection, OpenFlags, params};
use shardline_input::Record;
use shardline_runtime::MEMORY_TARGET;

use crate::{
    backend::{ShardBackend, ShardConnection},
    error::BackendError,
    schema::{INSERT_SQL, SELECT_ALL_SQL},
    targets::ShardTargets,
};

/// SQLite backend: one database per shard.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    targets: ShardTargets,
    create_missing: bool,
}

impl SqliteBackend {
    /// Backend that creates missing database files (and their directories).
    pub fn new(targets: ShardTargets) -> Self {
        Self {
            targets,
            create_missing: true,
        }
    }

    /// Backend that only opens databases that already exist.
    pub fn existing(targets: ShardTargets) -> Self {
        Self {
            targets,
            create_missing: false,
        }
    }

    pub fn targets(&self) -> &ShardTargets {
        &self.targets
    }

    fn open(&self, target: &str) -> Result<Connection, BackendError> {
        if target == MEMORY_TARGET {
            return Ok(Connection::open_in_memory()?);
        }

        let path = Path::new(target);
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        if self.create_missing {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        Ok(Connection::open_with_flags(path, flags)?)
    }
}

impl ShardBackend for SqliteBackend {
    type Connection = SqliteConnection;

    fn connect(&self, shard: usize) -> Result<SqliteConnection, BackendError> {
        let target = self.targets.target(shard)?;
        let conn = self.open(&target)?;
        debug!("[sqlite] shard {shard} opened at {target}");
        Ok(SqliteConnection { conn, shard })
    }

    fn describe(&self, shard: usize) -> String {
        match self.targets.target(shard) {
            Ok(target) => format!("shard {shard} ({target})"),
            Err(_) => format!("shard {shard} (no target)"),
        }
    }
}

pub struct SqliteConnection {
    conn: Connection,
    shard: usize,
}

impl SqliteConnection {
    pub fn shard(&self) -> usize {
        self.shard
    }
}

impl ShardConnection for SqliteConnection {
    fn create_schema(&mut self, ddl: &str) -> Result<(), BackendError> {
        self.conn.execute_batch(ddl)?;
        Ok(())
    }

    fn write_batch(&mut self, rows: &[Record]) -> Result<usize, BackendError> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Dropping an uncommitted transaction rolls it back.
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for r in rows {
                stmt.execute(params![r.id, r.name, r.email, r.partition_key])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    fn read_all(&mut self) -> Result<Vec<Record>, BackendError> {
        let mut stmt = self.conn.prepare(SELECT_ALL_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(Record {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                partition_key: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn close(self) -> Result<(), BackendError> {
        self.conn.close().map_err(|(_, e)| BackendError::from(e))
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
