use super::*;
use serial_test::serial;
use tempfile::tempdir;

fn temp_store() -> (HistoryStore, tempfile::TempDir) {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("history.log");
    let store = HistoryStore::with_path(path);
    (store, dir)
}

#[test]
fn load_event_new_derives_outcome_and_counts() {
    let before = Utc::now();
    let ok = LoadEvent::new("users.csv".into(), vec![1, 2, 3], 12, None);
    let after = Utc::now();

    assert_eq!(ok.version, HISTORY_VERSION);
    assert_eq!(ok.shard_count, 3);
    assert_eq!(ok.total_rows(), 6);
    assert_eq!(ok.outcome, RunOutcome::Ok);
    assert!(ok.error.is_none());
    assert!(ok.timestamp >= before && ok.timestamp <= after);

    let failed = LoadEvent::new(
        "users.csv".into(),
        vec![0, 0],
        3,
        Some("initialize failed: shard 1".into()),
    );
    assert_eq!(failed.outcome, RunOutcome::Failed);
    assert_eq!(failed.shard_count, 2);
}

#[test]
fn log_and_read_back_single_event() {
    let (store, _dir) = temp_store();

    store.log_load(LoadEvent::new("a.csv".into(), vec![2, 1, 1], 5, None));

    let loads = store.recent_loads(10);
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].input, "a.csv");
    assert_eq!(loads[0].rows_per_shard, vec![2, 1, 1]);
    assert_eq!(loads[0].duration_ms, 5);
    assert_eq!(loads[0].outcome, RunOutcome::Ok);
}

#[test]
fn outcome_serializes_lowercase_and_omits_missing_error() {
    let ev = HistoryEvent::Load(LoadEvent::new("a.csv".into(), vec![1], 1, None));
    let json = serde_json::to_string(&ev).expect("serialize");

    assert!(json.contains("\"outcome\":\"ok\""), "{json}");
    assert!(!json.contains("\"error\""), "{json}");
}

#[test]
fn recent_loads_returns_newest_first_and_truncates() {
    let (store, _dir) = temp_store();

    for name in ["first.csv", "second.csv", "third.csv"] {
        store.log_load(LoadEvent::new(name.into(), vec![1], 1, None));
    }

    let recent = store.recent_loads(2);
    let inputs: Vec<&str> = recent.iter().map(|l| l.input.as_str()).collect();
    assert_eq!(inputs, vec!["third.csv", "second.csv"]);
    assert_eq!(store.count(), 3);
}

#[test]
fn iter_events_empty_when_file_missing() {
    let (store, _dir) = temp_store();
    assert_eq!(store.count(), 0);
    assert!(store.recent_loads(5).is_empty());
}

#[test]
fn clear_removes_file_and_is_idempotent() {
    let (store, _dir) = temp_store();
    let path = store.path().to_path_buf();

    store.log_load(LoadEvent::new("q.csv".into(), vec![1], 1, None));
    assert!(path.exists());

    store.clear().expect("clear should succeed");
    assert!(!path.exists());

    store.clear().expect("clear should be idempotent");
    assert!(!path.exists());
}

#[test]
fn malformed_lines_are_skipped() {
    use std::io::Write as _;

    let (store, _dir) = temp_store();
    let path = store.path().to_path_buf();

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .expect("open history file for malformed write");
        writeln!(file, "this is not json").unwrap();
    }

    store.log_load(LoadEvent::new("ok.csv".into(), vec![4], 1, None));

    let loads = store.recent_loads(10);
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].input, "ok.csv");
}

#[test]
#[serial]
fn new_respects_history_disabled_env() {
    let cases: &[(Option<&str>, bool)] = &[
        (None, true),
        (Some("0"), false),
        (Some("false"), false),
        (Some("FALSE"), false),
        (Some("1"), true),
        (Some("TRUE"), true),
    ];

    for (value, enabled) in cases {
        match value {
            Some(v) => unsafe { std::env::set_var(HISTORY_DISABLED_ENV, v) },
            None => unsafe { std::env::remove_var(HISTORY_DISABLED_ENV) },
        }
        assert_eq!(
            HistoryStore::new().is_some(),
            *enabled,
            "{HISTORY_DISABLED_ENV}={value:?}"
        );
    }

    unsafe { std::env::remove_var(HISTORY_DISABLED_ENV) };
}

#[test]
#[serial]
fn state_dir_prefers_xdg_state_home() {
    let dir = tempdir().expect("create temp dir");
    unsafe { std::env::set_var("XDG_STATE_HOME", dir.path()) };

    assert_eq!(state_dir(), Some(dir.path().join(PROGRAM_NAME)));
    assert_eq!(
        history_log_path(),
        Some(dir.path().join(PROGRAM_NAME).join("history.log"))
    );

    unsafe { std::env::remove_var("XDG_STATE_HOME") };
}
