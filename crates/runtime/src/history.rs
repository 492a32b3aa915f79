use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PROGRAM_NAME;

pub const HISTORY_VERSION: u8 = 1;

pub const HISTORY_DISABLED_ENV: &str = "SHARDLINE_HISTORY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum HistoryEvent {
    Load(LoadEvent),
}

/// One `load` run, as recorded in the history log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadEvent {
    /// Schema version
    pub version: u8,

    pub timestamp: DateTime<Utc>,

    /// Input file the rows were read from.
    pub input: String,

    pub shard_count: usize,

    /// Rows written to each shard, indexed by shard.
    pub rows_per_shard: Vec<usize>,

    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,

    pub outcome: RunOutcome,

    /// Failure message when `outcome` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadEvent {
    pub fn new(
        input: String,
        rows_per_shard: Vec<usize>,
        duration_ms: u64,
        error: Option<String>,
    ) -> Self {
        Self {
            version: HISTORY_VERSION,
            timestamp: Utc::now(),
            input,
            shard_count: rows_per_shard.len(),
            rows_per_shard,
            duration_ms,
            outcome: if error.is_some() {
                RunOutcome::Failed
            } else {
                RunOutcome::Ok
            },
            error,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.rows_per_shard.iter().sum()
    }
}

pub struct HistoryStore {
    path: PathBuf,
}

pub fn state_dir() -> Option<PathBuf> {
    if let Ok(xdg_state) = env::var("XDG_STATE_HOME")
        && !xdg_state.is_empty()
    {
        return Some(PathBuf::from(xdg_state).join(PROGRAM_NAME));
    }

    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|p| p.join(PROGRAM_NAME))
}

pub fn history_log_path() -> Option<PathBuf> {
    state_dir().map(|d| d.join("history.log"))
}

fn history_disabled() -> bool {
    match env::var(HISTORY_DISABLED_ENV) {
        Ok(val) => val == "0" || val.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}

impl HistoryStore {
    pub fn new() -> Option<Self> {
        if history_disabled() {
            return None;
        }

        let path = history_log_path()?;
        Some(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best effort: a history write failure never fails the run.
    pub fn log_load(&self, event: LoadEvent) {
        if let Err(e) = self.append_event(&HistoryEvent::Load(event)) {
            debug!("Failed to log history event: {}", e);
        }
    }

    fn append_event(&self, event: &HistoryEvent) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(event).map_err(io::Error::other)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // One line per write_all; O_APPEND keeps concurrent runs from interleaving mid-line
        // in the common case.
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    pub fn iter_events(&self) -> impl Iterator<Item = HistoryEvent> {
        self.read_events().into_iter().flatten()
    }

    fn read_events(&self) -> Option<Vec<HistoryEvent>> {
        let file = File::open(&self.path).ok()?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            match line {
                Ok(line) => match serde_json::from_str(&line) {
                    Ok(ev) => events.push(ev),
                    Err(e) => debug!("Skipping malformed history line: {e}"),
                },
                Err(e) => {
                    debug!("Error reading history log: {e}");
                    break;
                }
            }
        }
        Some(events)
    }

    /// Most recent runs first.
    pub fn recent_loads(&self, limit: usize) -> Vec<LoadEvent> {
        let mut loads: Vec<LoadEvent> = self
            .iter_events()
            .map(|e| match e {
                HistoryEvent::Load(l) => l,
            })
            .collect();

        loads.reverse();
        loads.truncate(limit);
        loads
    }

    pub fn count(&self) -> usize {
        self.iter_events().count()
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
