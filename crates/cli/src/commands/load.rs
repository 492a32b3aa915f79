use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use log::{error, info, warn};
use shardline_input::{MalformedRowPolicy, RecordReader};
use shardline_pipeline::{IngestPipeline, PipelineConfig, RunError, RunReport, WriteErrorPolicy};
use shardline_runtime::{
    DEFAULT_BATCH_SIZE,
    history::{HistoryStore, LoadEvent},
};
use shardline_store::{SqliteBackend, schema_ddl};

use super::{ShardArgs, positive};
use crate::printer::Printer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OnWriteError {
    /// Stop the load at the first failed batch
    #[default]
    Abort,
    /// Drop the failed batch and keep loading
    Continue,
}

impl From<OnWriteError> for WriteErrorPolicy {
    fn from(value: OnWriteError) -> Self {
        match value {
            OnWriteError::Abort => WriteErrorPolicy::Abort,
            OnWriteError::Continue => WriteErrorPolicy::Continue,
        }
    }
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// CSV file with a header row and `id,name,email,country` columns
    pub input: PathBuf,

    #[command(flatten)]
    pub shards: ShardArgs,

    /// Rows buffered per shard before a batched write
    #[arg(long, short = 'b', default_value_t = DEFAULT_BATCH_SIZE, value_parser = positive)]
    pub batch_size: usize,

    /// Keep tables that already exist instead of failing
    #[arg(long)]
    pub reuse_tables: bool,

    /// Skip rows that fail to parse instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// What to do when a batched write fails
    #[arg(long, value_enum, default_value_t = OnWriteError::Abort)]
    pub on_write_error: OnWriteError,

    /// Use one writer thread per shard
    #[arg(long)]
    pub parallel: bool,

    /// Skip reading the shards back after loading
    #[arg(long)]
    pub no_verify: bool,
}

impl LoadArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            shard_count: self.shards.shards,
            batch_size: self.batch_size,
            schema_ddl: schema_ddl(self.reuse_tables).to_owned(),
            write_errors: self.on_write_error.into(),
            parallel: self.parallel,
            verify: !self.no_verify,
            ..PipelineConfig::default()
        }
    }

    fn malformed_rows(&self) -> MalformedRowPolicy {
        if self.skip_malformed {
            MalformedRowPolicy::Skip
        } else {
            MalformedRowPolicy::Abort
        }
    }
}

pub fn run(args: LoadArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(e) => {
            error!("[error] {e:#}");
            eprintln!("[load] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: LoadArgs) -> Result<ExitCode> {
    let targets = args.shards.targets()?;
    let config = args.pipeline_config();
    let shard_count = config.shard_count;

    let mut reader = RecordReader::open(&args.input, args.malformed_rows())
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut pipeline = IngestPipeline::new(config, SqliteBackend::new(targets))?;

    info!("Loading {} into {shard_count} shards", args.input.display());
    let start = Instant::now();
    let outcome = pipeline.run(&mut reader);
    let duration_ms = start.elapsed().as_millis() as u64;

    if reader.skipped() > 0 {
        warn!("skipped {} malformed rows", reader.skipped());
        eprintln!("[load] skipped {} malformed rows", reader.skipped());
    }

    record_history(&args, shard_count, &outcome, duration_ms);

    let mut printer = Printer::stdout();
    match outcome {
        Ok(report) => {
            printer.run_report(&report)?;

            let Some(verification) = &report.verification else {
                return Ok(ExitCode::SUCCESS);
            };
            printer.verification(verification)?;

            if verification.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Err(e) => {
            error!("[error] {e}");
            Printer::new(std::io::stderr()).run_error(&e)?;
            Ok(ExitCode::from(2))
        }
    }
}

fn record_history(
    args: &LoadArgs,
    shard_count: usize,
    outcome: &Result<RunReport, RunError>,
    duration_ms: u64,
) {
    let Some(store) = HistoryStore::new() else {
        return;
    };

    store.log_load(load_event(&args.input, shard_count, outcome, duration_ms));
}

/// History entry for one run. A failed run still records the rows its
/// shards committed before the failure.
fn load_event(
    input: &Path,
    shard_count: usize,
    outcome: &Result<RunReport, RunError>,
    duration_ms: u64,
) -> LoadEvent {
    let (rows_per_shard, error) = match outcome {
        Ok(report) => (report.written.clone(), None),
        Err(e) if e.written.is_empty() => (vec![0; shard_count], Some(e.to_string())),
        Err(e) => (e.written.clone(), Some(e.to_string())),
    };

    LoadEvent::new(
        input.display().to_string(),
        rows_per_shard,
        duration_ms,
        error,
    )
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
