//! On-device persistence for the local store.
//!
//! Pure mechanical save/load: the whole [`StoreState`] is serialized as one
//! JSON document at a well-known file name and restored verbatim on startup.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::store::StoreState;

/// Well-known document name under the data directory.
pub const STORAGE_FILE: &str = "fieldpulse-storage.json";

/// Serializes the store to durable storage and restores it on startup.
#[derive(Debug, Clone)]
pub struct Persistence {
    path: PathBuf,
}

impl Persistence {
    /// Persist under `dir/`[`STORAGE_FILE`], creating `dir` on first save.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    /// Persist at an explicit file path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// A missing document yields the default state; an unreadable one is
    /// logged and likewise replaced by the default rather than failing
    /// startup.
    #[must_use]
    pub fn load(&self) -> StoreState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return StoreState::default();
            }
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "failed to read store document");
                return StoreState::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "store document is corrupt; starting fresh");
                StoreState::default()
            }
        }
    }

    /// Write the state atomically (temp file, then rename).
    pub fn save(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalStore, TimerState};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_document_yields_default() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path());
        assert_eq!(persistence.load(), StoreState::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path());

        let mut state = StoreState::default();
        state.profile.name = "Sam".to_string();
        state.streak_count = 4;
        persistence.save(&state).unwrap();

        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn test_corrupt_document_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path());
        fs::write(persistence.path(), "not json").unwrap();
        assert_eq!(persistence.load(), StoreState::default());
    }

    #[test]
    fn test_running_timer_survives_restart() {
        let dir = tempdir().unwrap();

        let store = LocalStore::load(Persistence::new(dir.path()));
        store.start_timer();
        drop(store);

        let restored = LocalStore::load(Persistence::new(dir.path()));
        assert!(matches!(
            restored.with_state(|s| s.timer),
            TimerState::Running { .. }
        ));
    }
}
