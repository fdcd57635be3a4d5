use chrono::Local;
use rusqlite::{params, Connection, Result};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::FinalizedSession;

/// One stored row of the practice history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub distance_meters: u16,
    pub arrows_per_end: u8,
    pub total_score: u32,
    pub total_arrows: u32,
    pub recorded_at: String,
}

/// Local store of finalized sessions.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the default history database, creating it if needed.
    pub fn new() -> Result<Self> {
        let db_path =
            AppDirs::history_db_path().unwrap_or_else(|| PathBuf::from("bullseye_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(db_path)
    }

    /// Open a history database at an explicit path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS practice_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                distance_meters INTEGER NOT NULL,
                arrows_per_end INTEGER NOT NULL,
                total_score INTEGER NOT NULL,
                total_arrows INTEGER NOT NULL,
                session_data TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_practice_sessions_recorded_at \
             ON practice_sessions(recorded_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Insert a finalized session. Returns the new row id.
    pub fn record_session(&self, record: &FinalizedSession) -> Result<i64> {
        let session_data = serde_json::to_string(&record.ends_snapshot).unwrap_or_default();
        self.conn.execute(
            r#"
            INSERT INTO practice_sessions
            (distance_meters, arrows_per_end, total_score, total_arrows, session_data, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.distance_meters,
                record.arrows_per_end,
                record.total_score,
                record.total_arrows,
                session_data,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest-first listing for the history command.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, distance_meters, arrows_per_end, total_score, total_arrows, recorded_at
             FROM practice_sessions ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                distance_meters: row.get(1)?,
                arrows_per_end: row.get(2)?,
                total_score: row.get(3)?,
                total_arrows: row.get(4)?,
                recorded_at: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    /// Dump every stored session as CSV, oldest first.
    pub fn export_csv<W: Write>(&self, writer: W) -> std::result::Result<(), Box<dyn Error>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, distance_meters, arrows_per_end, total_score, total_arrows, recorded_at
             FROM practice_sessions ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u16>(1)?,
                row.get::<_, u8>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "id",
            "distance_meters",
            "arrows_per_end",
            "total_score",
            "total_arrows",
            "recorded_at",
        ])?;

        for row in rows {
            let (id, distance, arrows, score, total, recorded_at) = row?;
            csv_writer.write_record([
                id.to_string(),
                distance.to_string(),
                arrows.to_string(),
                score.to_string(),
                total.to_string(),
                recorded_at,
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::end::Shot;
    use crate::score::ShotValue;
    use crate::session::Session;
    use tempfile::tempdir;

    fn finalized(distance: u16) -> FinalizedSession {
        let mut session = Session::start(distance, 3);
        for value in [ShotValue::InnerTen, ShotValue::Ring(9), ShotValue::Miss] {
            session.record_shot(Shot::new(50.0, 50.0, value)).unwrap();
        }
        session.finalize()
    }

    #[test]
    fn record_and_list_round_trip() {
        let dir = tempdir().unwrap();
        let db = HistoryDb::open(dir.path().join("history.db")).unwrap();

        let first = db.record_session(&finalized(18)).unwrap();
        let second = db.record_session(&finalized(70)).unwrap();
        assert!(second > first);

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first.
        assert_eq!(recent[0].distance_meters, 70);
        assert_eq!(recent[1].distance_meters, 18);
        assert_eq!(recent[0].total_score, 19);
        assert_eq!(recent[0].total_arrows, 3);
    }

    #[test]
    fn listing_respects_the_limit() {
        let dir = tempdir().unwrap();
        let db = HistoryDb::open(dir.path().join("history.db")).unwrap();
        for _ in 0..5 {
            db.record_session(&finalized(18)).unwrap();
        }
        assert_eq!(db.recent_sessions(3).unwrap().len(), 3);
    }

    #[test]
    fn csv_export_contains_header_and_rows() {
        let dir = tempdir().unwrap();
        let db = HistoryDb::open(dir.path().join("history.db")).unwrap();
        db.record_session(&finalized(30)).unwrap();

        let mut out = Vec::new();
        db.export_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,distance_meters,arrows_per_end,total_score,total_arrows,recorded_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,30,3,19,3,"));
    }
}
