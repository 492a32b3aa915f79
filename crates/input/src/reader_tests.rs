use super::*;
use std::io::Cursor;

fn reader(input: &str, policy: MalformedRowPolicy) -> RecordReader<Cursor<Vec<u8>>> {
    RecordReader::from_reader(Cursor::new(input.as_bytes().to_vec()), policy)
}

#[test]
fn header_is_skipped_and_rows_decode_in_order() {
    let input = "id,name,email,country\n\
                 1,Test User A,a@test.com,USA\n\
                 2,Test User B,b@test.com,Canada\n";

    let records: Vec<Record> = reader(input, MalformedRowPolicy::Abort)
        .collect::<Result<_, _>>()
        .expect("valid input");

    assert_eq!(
        records,
        vec![
            Record::new(1, "Test User A", "a@test.com", "USA"),
            Record::new(2, "Test User B", "b@test.com", "Canada"),
        ]
    );
}

#[test]
fn header_only_and_empty_inputs_yield_nothing() {
    let cases = ["", "id,name,email,country\n"];

    for input in cases {
        let mut r = reader(input, MalformedRowPolicy::Abort);
        assert!(r.next().is_none(), "input {input:?} should yield no rows");
        assert!(r.next().is_none(), "reader must stay exhausted");
    }
}

#[test]
fn quoted_fields_and_extra_columns_are_accepted() {
    let input = "id,name,email,country,notes\n\
                 7,\"Doe, Jane\",jane@x,\"United Kingdom\",ignored\n";

    let records: Vec<Record> = reader(input, MalformedRowPolicy::Abort)
        .collect::<Result<_, _>>()
        .expect("valid input");

    assert_eq!(
        records,
        vec![Record::new(7, "Doe, Jane", "jane@x", "United Kingdom")]
    );
}

#[test]
fn empty_partition_key_is_a_valid_record() {
    let input = "id,name,email,country\n3,C,c@x,\n";

    let records: Vec<Record> = reader(input, MalformedRowPolicy::Abort)
        .collect::<Result<_, _>>()
        .expect("valid input");

    assert_eq!(records, vec![Record::new(3, "C", "c@x", "")]);
}

#[test]
fn malformed_id_is_a_parse_error_by_default() {
    let cases: &[(&str, &str)] = &[
        ("abc", "abc"),
        ("", ""),
        (" 4", " 4"),
        ("1.5", "1.5"),
        ("99999999999999999999", "99999999999999999999"),
        ("3000000000", "3000000000"),
        ("2147483648", "2147483648"),
        ("-2147483649", "-2147483649"),
    ];

    for (raw, expected_value) in cases {
        let input = format!("id,name,email,country\n1,A,a@x,USA\n{raw},B,b@x,Canada\n");
        let mut r = reader(&input, MalformedRowPolicy::Abort);

        assert!(matches!(r.next(), Some(Ok(ref rec)) if rec.id == 1));

        match r.next() {
            Some(Err(InputError::Parse { line, field, value })) => {
                assert_eq!(line, 3, "raw id {raw:?}");
                assert_eq!(field, "id");
                assert_eq!(value, *expected_value);
            }
            other => panic!("raw id {raw:?}: expected parse error, got {other:?}"),
        }
    }
}

#[test]
fn short_row_is_a_shape_error() {
    let input = "id,name,email,country\n1,A,a@x\n";
    let mut r = reader(input, MalformedRowPolicy::Abort);

    match r.next() {
        Some(Err(err @ InputError::Shape { .. })) => {
            assert!(err.is_row_error());
            assert_eq!(
                err.to_string(),
                "line 2: expected at least 4 fields, found 3"
            );
        }
        other => panic!("expected shape error, got {other:?}"),
    }
}

#[test]
fn skip_policy_drops_bad_rows_and_counts_them() {
    let input = "id,name,email,country\n\
                 1,A,a@x,USA\n\
                 x,B,b@x,Canada\n\
                 3,C\n\
                 4,D,d@x,USA\n";

    let mut r = reader(input, MalformedRowPolicy::Skip);
    let ids: Vec<i64> = r
        .by_ref()
        .map(|res| res.expect("skip policy yields only good rows").id)
        .collect();

    assert_eq!(ids, vec![1, 4]);
    assert_eq!(r.skipped(), 2);
}

#[test]
fn invalid_utf8_is_fatal_even_when_skipping() {
    let mut bytes = b"id,name,email,country\n1,".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b",a@x,USA\n2,B,b@x,USA\n");

    let mut r = RecordReader::from_reader(Cursor::new(bytes), MalformedRowPolicy::Skip);

    match r.next() {
        Some(Err(err @ InputError::Csv(_))) => assert!(!err.is_row_error()),
        other => panic!("expected csv error, got {other:?}"),
    }
    assert!(r.next().is_none(), "reader stops after a stream error");
}

#[test]
fn open_reports_missing_file_as_io_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("missing.csv");

    match RecordReader::open(&missing, MalformedRowPolicy::Abort) {
        Err(InputError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        Err(other) => panic!("expected io error, got {other:?}"),
        Ok(_) => panic!("expected io error, got a reader"),
    }
}

#[test]
fn open_reads_rows_from_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("users.csv");
    std::fs::write(&path, "id,name,email,country\n101,Alice,alice@test.com,USA\n")
        .expect("write csv");

    let records: Vec<Record> = RecordReader::open(&path, MalformedRowPolicy::Abort)
        .expect("open csv")
        .collect::<Result<_, _>>()
        .expect("valid input");

    assert_eq!(
        records,
        vec![Record::new(101, "Alice", "alice@test.com", "USA")]
    );
}

#[test]
fn id_accepts_the_full_32_bit_range() {
    let input = "id,name,email,country\n2147483647,A,a@x,USA\n-2147483648,B,b@x,USA\n";
    let ids: Vec<i64> = reader(input, MalformedRowPolicy::Abort)
        .map(|res| res.expect("in-range id").id)
        .collect();

    assert_eq!(ids, vec![i64::from(i32::MAX), i64::from(i32::MIN)]);
}
