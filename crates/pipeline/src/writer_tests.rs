use super::*;
use crate::testing::{FakeBackend, FakeConnection, Faults, rec};
use shardline_store::ShardBackend;

fn shard_conn(backend: &FakeBackend, shard: usize) -> FakeConnection {
    let mut conn = backend.connect(shard).expect("connect");
    conn.create_schema("ddl").expect("schema");
    conn
}

#[test]
fn exactly_batch_size_rows_flush_once_and_leave_nothing_buffered() {
    let backend = FakeBackend::new();
    let mut conn = shard_conn(&backend, 0);
    let mut writer = BatchWriter::new(0, 3);

    let flushed: Vec<usize> = (1..=3)
        .map(|id| writer.add(rec(id, "USA"), &mut conn).expect("add"))
        .collect();

    assert_eq!(flushed, vec![0, 0, 3]);
    assert_eq!(writer.buffered(), 0);
    assert_eq!(writer.drain(&mut conn).expect("drain"), 0);
    assert_eq!(backend.writes(0), vec![vec![1, 2, 3]]);

    let stats = writer.stats();
    assert_eq!(stats.implicit_flushes, 1);
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.rows_written, 3);
}

#[test]
fn one_past_batch_size_leaves_a_single_row_for_drain() {
    let backend = FakeBackend::new();
    let mut conn = shard_conn(&backend, 0);
    let mut writer = BatchWriter::new(0, 3);

    for id in 1..=4 {
        writer.add(rec(id, "USA"), &mut conn).expect("add");
    }
    assert_eq!(writer.buffered(), 1);
    assert_eq!(writer.drain(&mut conn).expect("drain"), 1);

    assert_eq!(backend.writes(0), vec![vec![1, 2, 3], vec![4]]);
    assert_eq!(writer.stats().implicit_flushes, 1);
    assert_eq!(writer.stats().flushes, 2);
}

#[test]
fn flush_on_empty_buffer_is_a_no_op() {
    let backend = FakeBackend::new();
    let mut conn = shard_conn(&backend, 0);
    let mut writer = BatchWriter::new(0, 10);

    assert_eq!(writer.flush(&mut conn).expect("flush"), 0);
    assert!(backend.writes(0).is_empty());
    assert_eq!(writer.stats(), WriterStats::default());
}

#[test]
fn batch_size_one_writes_every_row_immediately() {
    let backend = FakeBackend::new();
    let mut conn = shard_conn(&backend, 0);
    let mut writer = BatchWriter::new(0, 1);

    for id in 1..=3 {
        assert_eq!(writer.add(rec(id, "USA"), &mut conn).expect("add"), 1);
    }
    assert_eq!(backend.writes(0), vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn failed_flush_keeps_rows_buffered() {
    let backend = FakeBackend::with_faults(Faults {
        write: vec![1],
        ..Faults::default()
    });
    let mut conn = shard_conn(&backend, 1);
    let mut writer = BatchWriter::new(1, 2);

    writer.add(rec(1, "Canada"), &mut conn).expect("first add buffers");
    let err = writer
        .add(rec(2, "Canada"), &mut conn)
        .expect_err("implicit flush fails");

    match err {
        ShardError::Write { shard, rows, .. } => {
            assert_eq!(shard, 1);
            assert_eq!(rows, 2);
        }
        other => panic!("expected write error, got {other}"),
    }
    assert_eq!(writer.buffered(), 2, "rows are kept for a retry");
    assert_eq!(writer.stats().rows_written, 0);
    assert_eq!(writer.stats().implicit_flushes, 0);

    assert_eq!(writer.discard(), 2);
    assert_eq!(writer.buffered(), 0);
    assert_eq!(writer.stats().rows_dropped, 2);
}

#[test]
fn zero_batch_size_is_treated_as_one() {
    let backend = FakeBackend::new();
    let mut conn = shard_conn(&backend, 0);
    let mut writer = BatchWriter::new(0, 0);

    assert_eq!(writer.add(rec(1, "USA"), &mut conn).expect("add"), 1);
}
