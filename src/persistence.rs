use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::session::Session;

/// Snapshots older than this are discarded on load.
pub const STALE_AFTER_MS: i64 = 30 * 60 * 1000;

/// The single stored snapshot of an in-progress session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(flatten)]
    pub session: Session,
    pub saved_at_epoch_millis: i64,
}

impl PersistedSnapshot {
    /// Snapshot the session as of now.
    pub fn taken(session: &Session) -> Self {
        Self::taken_at(session, Utc::now().timestamp_millis())
    }

    pub fn taken_at(session: &Session, saved_at_epoch_millis: i64) -> Self {
        Self {
            session: session.clone(),
            saved_at_epoch_millis,
        }
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms - self.saved_at_epoch_millis > STALE_AFTER_MS
    }
}

#[derive(Debug, Error)]
enum SnapshotError {
    #[error("snapshot unreadable: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("snapshot violates session invariants")]
    Malformed,
}

/// Store holding at most one in-progress session snapshot.
///
/// Saves happen after every session mutation and are fire-and-forget;
/// `clear` runs on finalize and on explicit abandon.
pub trait SnapshotStore {
    /// The stored snapshot, or `None` when missing, corrupt, or stale.
    /// Corrupt and stale snapshots are deleted as a side effect.
    fn load(&self) -> Option<PersistedSnapshot>;
    fn save(&self, snapshot: &PersistedSnapshot) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// JSON snapshot file under the state directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::snapshot_path()
            .unwrap_or_else(|| PathBuf::from("bullseye_scoring_state.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    fn read_snapshot(&self) -> Result<PersistedSnapshot, SnapshotError> {
        let bytes = fs::read(&self.path)?;
        let snapshot: PersistedSnapshot = serde_json::from_slice(&bytes)?;
        if !snapshot.session.is_well_formed() {
            return Err(SnapshotError::Malformed);
        }
        Ok(snapshot)
    }

    /// Staleness judged against an explicit clock, for tests.
    pub fn load_at(&self, now_ms: i64) -> Option<PersistedSnapshot> {
        match self.read_snapshot() {
            Ok(snapshot) => {
                if snapshot.is_stale(now_ms) {
                    let _ = self.clear();
                    None
                } else {
                    Some(snapshot)
                }
            }
            Err(SnapshotError::Io(_)) => None,
            Err(SnapshotError::Corrupt(_)) | Err(SnapshotError::Malformed) => {
                let _ = self.clear();
                None
            }
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<PersistedSnapshot> {
        self.load_at(Utc::now().timestamp_millis())
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(snapshot).unwrap_or_default();
        fs::write(&self.path, data)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::end::Shot;
    use crate::score::ShotValue;
    use tempfile::tempdir;

    fn sample_session() -> Session {
        let mut session = Session::start(18, 3);
        session
            .record_shot(Shot::new(50.0, 50.0, ShotValue::InnerTen))
            .unwrap();
        session
    }

    #[test]
    fn staleness_threshold_is_thirty_minutes() {
        let snapshot = PersistedSnapshot::taken_at(&sample_session(), 1_000_000);
        assert!(!snapshot.is_stale(1_000_000 + STALE_AFTER_MS));
        assert!(snapshot.is_stale(1_000_000 + STALE_AFTER_MS + 1));
    }

    #[test]
    fn round_trip_preserves_the_session() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("state.json"));
        let session = sample_session();
        let snapshot = PersistedSnapshot::taken_at(&session, 42);
        store.save(&snapshot).unwrap();

        let loaded = store.load_at(100).unwrap();
        assert_eq!(loaded.session, session);
        assert_eq!(loaded.saved_at_epoch_millis, 42);
    }

    #[test]
    fn stale_snapshot_is_dropped_and_deleted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileSnapshotStore::with_path(&path);
        let snapshot = PersistedSnapshot::taken_at(&sample_session(), 0);
        store.save(&snapshot).unwrap();

        // Thirty-one minutes later.
        assert!(store.load_at(31 * 60 * 1000).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_snapshot_is_dropped_and_deleted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileSnapshotStore::with_path(&path);
        fs::write(&path, b"{ not json").unwrap();

        assert!(store.load_at(0).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_cursor_counts_as_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileSnapshotStore::with_path(&path);
        fs::write(
            &path,
            br#"{
                "distanceMeters": 18,
                "arrowsPerEnd": 3,
                "ends": [[]],
                "currentEndIndex": 7,
                "savedAtEpochMillis": 0
            }"#,
        )
        .unwrap();

        assert!(store.load_at(0).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("absent.json"));
        assert!(store.load_at(0).is_none());
        store.clear().unwrap();
    }

    #[test]
    fn wire_shape_matches_the_documented_snapshot() {
        let snapshot = PersistedSnapshot::taken_at(&sample_session(), 7);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["distanceMeters"], 18);
        assert_eq!(json["arrowsPerEnd"], 3);
        assert_eq!(json["currentEndIndex"], 0);
        assert_eq!(json["savedAtEpochMillis"], 7);
        assert_eq!(json["ends"][0][0]["ringValue"], "X");
    }
}
