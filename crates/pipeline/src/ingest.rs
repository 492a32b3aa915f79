use log::{debug, info, warn};
use shardline_input::{InputError, Record};
use shardline_store::ShardBackend;

use crate::{
    config::{PipelineConfig, WriteErrorPolicy},
    error::{Phase, PipelineError, RunError, ShardError},
    parallel::stream_parallel,
    pool::ShardPool,
    resolver::resolve,
    verify::{VerifyReport, verify},
    writer::BatchWriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    ShardsInitialized,
    Streaming,
    Draining,
    Verified,
    Closed,
    Failed,
}

/// What a completed run did, per shard.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Rows resolved to each shard.
    pub routed: Vec<usize>,
    /// Rows each shard confirmed as written.
    pub written: Vec<usize>,
    /// Rows written by each shard's final drain.
    pub drained: Vec<usize>,
    /// Rows thrown away after failed writes under [`WriteErrorPolicy::Continue`].
    pub dropped: Vec<usize>,
    /// Failed writes tolerated under [`WriteErrorPolicy::Continue`].
    pub write_errors: Vec<ShardError>,
    pub verification: Option<VerifyReport>,
}

impl RunReport {
    pub(crate) fn new(shard_count: usize) -> Self {
        Self {
            routed: vec![0; shard_count],
            written: vec![0; shard_count],
            drained: vec![0; shard_count],
            dropped: vec![0; shard_count],
            write_errors: Vec::new(),
            verification: None,
        }
    }

    pub fn total_routed(&self) -> usize {
        self.routed.iter().sum()
    }

    pub fn total_written(&self) -> usize {
        self.written.iter().sum()
    }

    pub(crate) fn record_writer(&mut self, writer: &BatchWriter) {
        let stats = writer.stats();
        self.written[writer.shard()] = stats.rows_written;
        self.dropped[writer.shard()] = stats.rows_dropped;
    }
}

pub(crate) type PhaseResult<T> = Result<T, (Phase, PipelineError)>;

pub(crate) fn in_phase<T, E: Into<PipelineError>>(
    phase: Phase,
    res: Result<T, E>,
) -> PhaseResult<T> {
    res.map_err(|e| (phase, e.into()))
}

/// Drives one load: initialize shards, stream rows into per-shard writers,
/// drain, verify, and always close.
///
/// A pipeline runs once; its state ends at [`RunState::Closed`] on success
/// and [`RunState::Failed`] otherwise.
pub struct IngestPipeline<B: ShardBackend> {
    config: PipelineConfig,
    backend: B,
    state: RunState,
    transitions: Vec<RunState>,
}

impl<B: ShardBackend> IngestPipeline<B> {
    pub fn new(config: PipelineConfig, backend: B) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            state: RunState::NotStarted,
            transitions: vec![RunState::NotStarted],
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state entered so far, starting with `NotStarted`.
    pub fn transitions(&self) -> &[RunState] {
        &self.transitions
    }

    fn enter(&mut self, next: RunState) {
        if self.state == RunState::Failed {
            return;
        }
        debug!("[pipeline] {:?} -> {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    /// Load `rows` into the shards.
    ///
    /// Shard connections are closed on every exit path; close failures are
    /// reported in [`RunError::cleanup`], or as a [`Phase::Close`] error when
    /// the run itself succeeded.
    pub fn run<I>(&mut self, rows: I) -> Result<RunReport, RunError>
    where
        I: IntoIterator<Item = Result<Record, InputError>>,
    {
        if self.state != RunState::NotStarted {
            return Err(RunError::new(Phase::Initialize, PipelineError::AlreadyRan));
        }

        let mut pool = ShardPool::new();
        let mut writers: Vec<BatchWriter> = (0..self.config.shard_count)
            .map(|shard| BatchWriter::new(shard, self.config.batch_size))
            .collect();
        let outcome = self.execute(&mut pool, &mut writers, rows);
        let cleanup = pool.close_all();
        let written: Vec<usize> = writers.iter().map(|w| w.stats().rows_written).collect();

        match outcome {
            Ok(report) if cleanup.is_empty() => {
                self.enter(RunState::Closed);
                info!("Connections closed");
                Ok(report)
            }
            Ok(_) => {
                self.enter(RunState::Failed);
                Err(RunError {
                    phase: Phase::Close,
                    source: PipelineError::Cleanup {
                        failed: cleanup.len(),
                    },
                    cleanup,
                    written,
                })
            }
            Err((phase, source)) => {
                self.enter(RunState::Failed);
                Err(RunError {
                    phase,
                    source,
                    cleanup,
                    written,
                })
            }
        }
    }

    fn execute<I>(
        &mut self,
        pool: &mut ShardPool<B::Connection>,
        writers: &mut [BatchWriter],
        rows: I,
    ) -> PhaseResult<RunReport>
    where
        I: IntoIterator<Item = Result<Record, InputError>>,
    {
        let n = self.config.shard_count;

        in_phase(
            Phase::Initialize,
            pool.initialize_all(&self.backend, n, &self.config.schema_ddl),
        )?;
        self.enter(RunState::ShardsInitialized);

        let mut report = RunReport::new(n);

        self.enter(RunState::Streaming);
        if self.config.parallel {
            stream_parallel(&self.config, pool, writers, rows, &mut report)?;
            self.enter(RunState::Draining);
        } else {
            self.stream(pool, writers, rows, &mut report)?;
            self.enter(RunState::Draining);
            self.drain(pool, writers, &mut report)?;
        }

        for writer in writers.iter() {
            report.record_writer(writer);
        }

        if self.config.verify {
            info!("Verifying data in shards");
            report.verification = Some(verify(pool));
            self.enter(RunState::Verified);
        }

        Ok(report)
    }

    fn stream<I>(
        &self,
        pool: &mut ShardPool<B::Connection>,
        writers: &mut [BatchWriter],
        rows: I,
        report: &mut RunReport,
    ) -> PhaseResult<()>
    where
        I: IntoIterator<Item = Result<Record, InputError>>,
    {
        let n = self.config.shard_count;

        for item in rows {
            let record = in_phase(Phase::Stream, item)?;
            let shard = resolve(&record.partition_key, n);
            info!(
                "record {} ('{}') -> shard {shard}",
                record.id, record.partition_key
            );
            report.routed[shard] += 1;

            let conn = in_phase(Phase::Stream, pool.get_mut(shard))?;
            let writer = &mut writers[shard];
            if let Err(e) = writer.add(record, conn) {
                in_phase(
                    Phase::Stream,
                    handle_write_error(
                        self.config.write_errors,
                        e,
                        writer,
                        &mut report.write_errors,
                    ),
                )?;
            }
        }

        Ok(())
    }

    fn drain(
        &self,
        pool: &mut ShardPool<B::Connection>,
        writers: &mut [BatchWriter],
        report: &mut RunReport,
    ) -> PhaseResult<()> {
        info!("Executing final batches");

        for (writer, conn) in writers.iter_mut().zip(pool.connections_mut()) {
            match writer.drain(conn) {
                Ok(rows) => {
                    info!("shard {}: drained {rows} rows", writer.shard());
                    report.drained[writer.shard()] = rows;
                }
                Err(e) => in_phase(
                    Phase::Drain,
                    handle_write_error(
                        self.config.write_errors,
                        e,
                        writer,
                        &mut report.write_errors,
                    ),
                )?,
            }
        }

        Ok(())
    }
}

/// Apply the write-error policy to a failed flush of `writer`.
///
/// Under `Continue` the buffered rows are dropped and the error is kept in
/// `tolerated`; under `Abort` the error is handed back.
pub(crate) fn handle_write_error(
    policy: WriteErrorPolicy,
    err: ShardError,
    writer: &mut BatchWriter,
    tolerated: &mut Vec<ShardError>,
) -> Result<(), ShardError> {
    match policy {
        WriteErrorPolicy::Abort => Err(err),
        WriteErrorPolicy::Continue => {
            let dropped = writer.discard();
            warn!("{err}; dropped {dropped} rows and continuing");
            tolerated.push(err);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
