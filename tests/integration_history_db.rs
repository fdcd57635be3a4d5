use bullseye::end::Shot;
use bullseye::history::HistoryDb;
use bullseye::score::TargetGeometry;
use bullseye::session::Session;
use tempfile::tempdir;

/// Finalize real sessions into a history database on disk and read them
/// back through every query surface.

fn shoot_session(distance: u16, coords: &[(f64, f64)]) -> Session {
    let geo = TargetGeometry::default();
    let mut session = Session::start(distance, 3);
    for &(x, y) in coords {
        if session.current_end().is_complete(3) {
            session.advance_end().unwrap();
        }
        session
            .record_shot(Shot::new(x, y, geo.resolve(x, y)))
            .unwrap();
    }
    session
}

#[test]
fn finalized_sessions_round_trip_through_the_database() {
    let dir = tempdir().unwrap();
    let db = HistoryDb::open(dir.path().join("history.db")).unwrap();

    let short = shoot_session(18, &[(50.0, 50.0), (50.0, 56.0), (2.0, 2.0)]);
    let long = shoot_session(
        70,
        &[
            (50.0, 50.0),
            (50.0, 50.0),
            (50.0, 56.0),
            (62.0, 50.0),
            (50.0, 50.0),
        ],
    );

    db.record_session(&short.finalize()).unwrap();
    db.record_session(&long.finalize()).unwrap();

    let recent = db.recent_sessions(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].distance_meters, 70);
    assert_eq!(recent[0].total_arrows, 5);
    assert_eq!(recent[0].total_score, 10 + 10 + 9 + 8 + 10);
    assert_eq!(recent[1].distance_meters, 18);
    assert_eq!(recent[1].total_score, 19);

    let mut csv_out = Vec::new();
    db.export_csv(&mut csv_out).unwrap();
    let text = String::from_utf8(csv_out).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().contains("18"));
    assert!(text.lines().nth(2).unwrap().contains("70"));
}

#[test]
fn reopening_the_database_keeps_existing_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let db = HistoryDb::open(&path).unwrap();
        let session = shoot_session(30, &[(50.0, 50.0)]);
        db.record_session(&session.finalize()).unwrap();
    }

    let db = HistoryDb::open(&path).unwrap();
    let recent = db.recent_sessions(5).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].distance_meters, 30);
    assert_eq!(recent[0].total_score, 10);
    assert_eq!(recent[0].total_arrows, 1);
}
