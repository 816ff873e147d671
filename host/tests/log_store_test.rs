// Integration tests for the CSV shot log: header bootstrap, append order and
// reading volleys back exactly as they were committed.
use chrono::NaiveDate;
use quiver_core::{
    Distance, FixedClock, SessionId, ShootingSession, Shot, SystemClock, VolleyRecord,
    VolleySession,
};
use quiver_host::{LogStore, StoreError, LOG_HEADER};
use tempfile::TempDir;

fn clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_micro_opt(17, 45, 12, 501_337)
            .unwrap(),
    )
}

fn test_store() -> (LogStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = LogStore::open(dir.path().join("storico_frecce.csv")).unwrap();
    (store, dir)
}

#[test]
fn new_log_starts_with_exact_header() {
    let (store, _dir) = test_store();
    let contents = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(contents, format!("{}\n", LOG_HEADER));
    assert_eq!(
        LOG_HEADER,
        "datetime,session_id,volley,freccia,x,y,punteggio,distanza"
    );
}

#[test]
fn reopening_does_not_duplicate_header() {
    let (store, _dir) = test_store();
    let again = LogStore::open(store.path()).unwrap();
    let contents = std::fs::read_to_string(again.path()).unwrap();
    assert_eq!(contents.matches("datetime,").count(), 1);
}

#[test]
fn creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("2024").join("frecce.csv");
    let store = LogStore::open(&path).unwrap();
    assert!(store.path().exists());
}

#[test]
fn committed_volleys_read_back_in_order() {
    let (mut store, _dir) = test_store();
    let mut session =
        ShootingSession::new(SessionId::new("2024-09-01_17-40-00"), 3, Distance::new(50)).unwrap();

    session.add(Shot::new(0.0, 0.0)).unwrap();
    session.add(Shot::new(5.0, 0.0)).unwrap();
    session.add(Shot::new(11.0, 0.0)).unwrap();
    let first = session.commit_into(&clock(), &mut store).unwrap();

    session.add(Shot::new(-7.2, 0.4)).unwrap();
    let second = session.commit_into(&clock(), &mut store).unwrap();

    let read = store.read_all().unwrap();
    let expected: Vec<VolleyRecord> = first.into_iter().chain(second).collect();
    assert_eq!(read, expected);

    let tuples: Vec<(f64, f64, u8, u16)> = read
        .iter()
        .map(|r| (r.x, r.y, r.score, r.distance.metres()))
        .collect();
    assert_eq!(
        tuples,
        vec![
            (0.0, 0.0, 10, 50),
            (5.0, 0.0, 6, 50),
            (11.0, 0.0, 0, 50),
            (-7.2, 0.4, 3, 50),
        ]
    );
    assert_eq!(read[3].volley_number, 2);
    assert_eq!(read[3].arrow_index, 1);
}

#[test]
fn file_contents_are_plain_rows() {
    let (store, _dir) = test_store();
    let mut volley = VolleySession::new(3).unwrap();
    volley.add(Shot::new(1.5, -2.0)).unwrap();
    let records = volley
        .commit(&SessionId::new("2024-09-01_17-40-00"), 1, Distance::new(18), &clock())
        .unwrap();
    store.append(&records).unwrap();

    let contents = std::fs::read_to_string(store.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        "2024-09-01T17:45:12.501337,2024-09-01_17-40-00,1,1,1.5,-2.0,8,18"
    );
}

#[test]
fn foreign_header_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

    match LogStore::open(&path) {
        Err(StoreError::HeaderMismatch { found }) => assert_eq!(found, "a,b,c"),
        other => panic!("expected header mismatch, got {:?}", other),
    }
}

#[test]
fn malformed_row_reports_its_line() {
    let (store, _dir) = test_store();
    std::fs::write(
        store.path(),
        format!(
            "{}\n{}\n{}\n",
            LOG_HEADER,
            "2024-09-01T17:45:12,s,1,1,0.0,0.0,10,18",
            "2024-09-01T17:45:12,s,1,2,oops,0.0,10,18"
        ),
    )
    .unwrap();

    match store.read_all() {
        Err(StoreError::MalformedRow { line, reason }) => {
            assert_eq!(line, 3);
            assert!(reason.contains("bad x"), "{}", reason);
        }
        other => panic!("expected malformed row, got {:?}", other),
    }
}

#[test]
fn missing_trailing_newline_is_repaired_before_appending() {
    let (store, _dir) = test_store();
    std::fs::write(
        store.path(),
        format!("{}\n2024-09-01T17:45:12,s,1,1,0.0,0.0,10,18", LOG_HEADER),
    )
    .unwrap();

    let store = LogStore::open(store.path()).unwrap();
    let mut volley = VolleySession::new(3).unwrap();
    volley.add(Shot::new(0.0, 9.5)).unwrap();
    let records = volley
        .commit(&SessionId::new("s"), 2, Distance::new(18), &clock())
        .unwrap();
    store.append(&records).unwrap();

    let read = store.read_all().unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[1].score, 1);
}

#[test]
fn existing_log_is_read_without_being_touched() {
    let (store, _dir) = test_store();
    let contents = format!("{}\n2024-09-01T17:45:12,s,1,1,0.0,0.0,10,18", LOG_HEADER);
    std::fs::write(store.path(), &contents).unwrap();

    let reader = LogStore::existing(store.path()).unwrap();
    assert_eq!(reader.read_all().unwrap().len(), 1);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), contents);
}

#[test]
fn existing_requires_a_log_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.csv");
    match LogStore::existing(&path) {
        Err(StoreError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected a missing log, got {:?}", other),
    }
    assert!(!path.exists());
}

#[test]
fn wall_clock_records_read_back_unchanged() {
    let (store, _dir) = test_store();
    let mut session = ShootingSession::new(SessionId::new("s"), 3, Distance::new(18)).unwrap();
    session.add(Shot::new(1.25, -0.5)).unwrap();
    let records = session.commit(&SystemClock).unwrap();
    store.append(&records).unwrap();

    assert_eq!(store.read_all().unwrap(), records);
}
