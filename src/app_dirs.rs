use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("bullseye"),
            )
        } else {
            ProjectDirs::from("", "", "bullseye").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// In-progress session snapshot file.
    pub fn snapshot_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("scoring_state.json"))
    }

    /// Finalized session history database.
    pub fn history_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("history.db"))
    }

    /// User configuration file.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bullseye").map(|pd| pd.config_dir().join("config.json"))
    }
}
