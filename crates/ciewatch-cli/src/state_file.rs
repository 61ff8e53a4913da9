//! Opt-in JSON persistence for the watcher state.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ciewatch_core::WatcherState;

#[derive(Debug, Clone)]
pub(crate) struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is an empty state; an unreadable
    /// or corrupt one is logged and also treated as empty.
    pub(crate) fn load(&self) -> WatcherState {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file yet; starting empty");
                return WatcherState::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read state file; starting empty");
                return WatcherState::default();
            }
        };
        match serde_json::from_str::<WatcherState>(&text) {
            Ok(state) => {
                tracing::info!(path = %self.path.display(), entries = state.len(), "watcher state loaded");
                state
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file is corrupt; starting empty");
                WatcherState::default()
            }
        }
    }

    /// Write `state`, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub(crate) fn save(&self, state: &WatcherState) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(state).context("failed to encode watcher state")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ciewatch_core::AvailabilityRecord;

    use super::*;

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(StateFile::new(path).load().is_empty());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateFile::new(dir.path().join("nested").join("state.json"));

        let mut state = WatcherState::new();
        state.observe("centro", &AvailabilityRecord::new("Municipio I", "Via X", "10/01/2025"));
        store.save(&state).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, state);
        assert_eq!(loaded.last_seen("centro"), Some("10/01/2025"));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn file_is_a_plain_key_to_date_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"centro":"10/01/2025"}"#).unwrap();
        let state = StateFile::new(path).load();
        assert_eq!(state.last_seen("centro"), Some("10/01/2025"));
    }
}
