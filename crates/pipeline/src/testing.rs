//! In-process backend with scripted failures, shared by the pipeline tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use shardline_input::Record;
use shardline_store::{BackendError, ShardBackend, ShardConnection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(usize),
    Schema(usize),
    /// Ids of the rows in one batched write.
    Write(usize, Vec<i64>),
    Read(usize),
    Close(usize),
}

#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub connect: Option<usize>,
    pub schema: Option<usize>,
    pub write: Vec<usize>,
    pub read: Vec<usize>,
    pub close: Vec<usize>,
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    tables: HashMap<usize, Vec<Record>>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    faults: Faults,
    shared: Arc<Mutex<Shared>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            shared: Arc::default(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.lock().unwrap().events.clone()
    }

    pub fn closed(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Close(shard) => Some(shard),
                _ => None,
            })
            .collect()
    }

    /// Ids of each batch written to `shard`, in write order.
    pub fn writes(&self, shard: usize) -> Vec<Vec<i64>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(s, ids) if s == shard => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn stored(&self, shard: usize) -> Vec<Record> {
        self.shared
            .lock()
            .unwrap()
            .tables
            .get(&shard)
            .cloned()
            .unwrap_or_default()
    }
}

fn injected(what: &str, shard: usize) -> BackendError {
    BackendError::Other(format!("injected {what} failure on shard {shard}"))
}

impl ShardBackend for FakeBackend {
    type Connection = FakeConnection;

    fn connect(&self, shard: usize) -> Result<FakeConnection, BackendError> {
        if self.faults.connect == Some(shard) {
            return Err(injected("connect", shard));
        }
        self.shared.lock().unwrap().events.push(Event::Connect(shard));
        Ok(FakeConnection {
            shard,
            faults: self.faults.clone(),
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct FakeConnection {
    shard: usize,
    faults: Faults,
    shared: Arc<Mutex<Shared>>,
}

impl ShardConnection for FakeConnection {
    fn create_schema(&mut self, _ddl: &str) -> Result<(), BackendError> {
        if self.faults.schema == Some(self.shard) {
            return Err(injected("schema", self.shard));
        }
        let mut shared = self.shared.lock().unwrap();
        shared.events.push(Event::Schema(self.shard));
        shared.tables.entry(self.shard).or_default();
        Ok(())
    }

    fn write_batch(&mut self, rows: &[Record]) -> Result<usize, BackendError> {
        if self.faults.write.contains(&self.shard) {
            return Err(injected("write", self.shard));
        }
        let mut shared = self.shared.lock().unwrap();
        shared
            .events
            .push(Event::Write(self.shard, rows.iter().map(|r| r.id).collect()));
        shared
            .tables
            .entry(self.shard)
            .or_default()
            .extend_from_slice(rows);
        Ok(rows.len())
    }

    fn read_all(&mut self) -> Result<Vec<Record>, BackendError> {
        if self.faults.read.contains(&self.shard) {
            return Err(injected("read", self.shard));
        }
        let mut shared = self.shared.lock().unwrap();
        shared.events.push(Event::Read(self.shard));
        Ok(shared.tables.get(&self.shard).cloned().unwrap_or_default())
    }

    fn close(self) -> Result<(), BackendError> {
        self.shared.lock().unwrap().events.push(Event::Close(self.shard));
        if self.faults.close.contains(&self.shard) {
            return Err(injected("close", self.shard));
        }
        Ok(())
    }
}

pub fn rec(id: i64, key: &str) -> Record {
    Record::new(id, format!("Test User {id}"), format!("u{id}@test.com"), key)
}
