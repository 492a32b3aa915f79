use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};
use shardline_input::{InputError, Record};
use shardline_store::ShardConnection;

use crate::{
    config::{PipelineConfig, WriteErrorPolicy},
    error::{Phase, PipelineError, ShardError},
    ingest::{PhaseResult, RunReport, handle_write_error},
    pool::ShardPool,
    resolver::resolve,
    writer::BatchWriter,
};

/// What one shard worker did before it returned.
#[derive(Default)]
struct WorkerOutcome {
    drained: usize,
    write_errors: Vec<ShardError>,
    failure: Option<(Phase, ShardError)>,
}

/// Stream and drain with one writer thread per shard.
///
/// The calling thread resolves each row and hands it to its shard's worker
/// over a bounded channel, so every shard still sees its rows in input
/// order. Workers drain once their channel disconnects. All workers are
/// joined before any result is inspected. A failure on either side raises
/// the shared abort flag, which stops the remaining workers without draining.
pub(crate) fn stream_parallel<C, I>(
    config: &PipelineConfig,
    pool: &mut ShardPool<C>,
    writers: &mut [BatchWriter],
    rows: I,
    report: &mut RunReport,
) -> PhaseResult<()>
where
    C: ShardConnection,
    I: IntoIterator<Item = Result<Record, InputError>>,
{
    let n = config.shard_count;
    let policy = config.write_errors;
    let abort = AtomicBool::new(false);

    debug!("[parallel] starting {n} shard workers");

    let (dispatched, joined) = thread::scope(|s| {
        let mut senders = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);

        for (writer, conn) in writers.iter_mut().zip(pool.connections_mut()) {
            let (tx, rx) = channel::bounded::<Record>(config.channel_capacity);
            senders.push(tx);

            let abort = &abort;
            handles.push(s.spawn(move || shard_worker(writer, conn, rx, abort, policy)));
        }

        let dispatched = dispatch(rows, &senders, &abort, &mut report.routed);
        if dispatched.is_err() {
            abort.store(true, Ordering::Release);
        }
        // Disconnecting the channels is the end-of-input signal.
        drop(senders);

        let joined: Vec<thread::Result<WorkerOutcome>> =
            handles.into_iter().map(|h| h.join()).collect();
        (dispatched, joined)
    });

    let mut failure = dispatched.err().map(|e| (Phase::Stream, e));

    for (shard, joined) in joined.into_iter().enumerate() {
        let Ok(outcome) = joined else {
            failure.get_or_insert((Phase::Stream, PipelineError::WorkerPanicked(shard)));
            continue;
        };

        report.drained[shard] = outcome.drained;
        report.write_errors.extend(outcome.write_errors);

        if let Some((phase, err)) = outcome.failure {
            match failure {
                None => failure = Some((phase, err.into())),
                Some(_) => warn!("[parallel] {err}"),
            }
        }
    }

    match failure {
        Some(f) => Err(f),
        None => Ok(()),
    }
}

fn dispatch<I>(
    rows: I,
    senders: &[Sender<Record>],
    abort: &AtomicBool,
    routed: &mut [usize],
) -> Result<(), PipelineError>
where
    I: IntoIterator<Item = Result<Record, InputError>>,
{
    let n = senders.len();

    for item in rows {
        if abort.load(Ordering::Acquire) {
            // A worker failed; its error surfaces from the join.
            return Ok(());
        }

        let record = item?;
        let shard = resolve(&record.partition_key, n);
        info!(
            "record {} ('{}') -> shard {shard}",
            record.id, record.partition_key
        );
        routed[shard] += 1;

        if senders[shard].send(record).is_err() {
            // Receiver gone: that worker already stopped.
            abort.store(true, Ordering::Release);
            return Ok(());
        }
    }

    Ok(())
}

fn shard_worker<C: ShardConnection>(
    writer: &mut BatchWriter,
    conn: &mut C,
    rx: Receiver<Record>,
    abort: &AtomicBool,
    policy: WriteErrorPolicy,
) -> WorkerOutcome {
    let mut outcome = WorkerOutcome::default();

    for record in rx.iter() {
        if abort.load(Ordering::Acquire) {
            return outcome;
        }

        if let Err(e) = writer.add(record, conn)
            && let Err(e) = handle_write_error(policy, e, writer, &mut outcome.write_errors)
        {
            abort.store(true, Ordering::Release);
            outcome.failure = Some((Phase::Stream, e));
            return outcome;
        }
    }

    if abort.load(Ordering::Acquire) {
        debug!("[parallel] shard {} stopping without drain", writer.shard());
        return outcome;
    }

    match writer.drain(conn) {
        Ok(rows) => {
            info!("shard {}: drained {rows} rows", writer.shard());
            outcome.drained = rows;
        }
        Err(e) => {
            if let Err(e) = handle_write_error(policy, e, writer, &mut outcome.write_errors) {
                abort.store(true, Ordering::Release);
                outcome.failure = Some((Phase::Drain, e));
            }
        }
    }

    outcome
}
