//! Save-game persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::game::GameState;

/// Root directory under the platform config directory used for save files.
pub const DEFAULT_SAVE_DIR: &str = "etsim/saves";

/// Metadata describing a persisted game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the save file on disk.
    pub path: PathBuf,
    /// Human readable save name.
    pub name: String,
    /// Timestamp when the save was written.
    pub updated_at: DateTime<Utc>,
}

/// Serialized representation of a save file: one game snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    name: String,
    saved_at: DateTime<Utc>,
    state: GameState,
}

impl SavePayload {
    fn new(name: &str, state: &GameState) -> Self {
        let trimmed = name.trim();
        Self {
            name: if trimmed.is_empty() {
                "Unnamed game".to_string()
            } else {
                trimmed.to_string()
            },
            saved_at: Utc::now(),
            state: state.clone(),
        }
    }

    /// Consume the payload and return the stored game state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Display name given at save time.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Manager responsible for loading and writing save files.
#[derive(Debug, Clone)]
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SAVE_DIR)
    }

    /// Return all known saves sorted by timestamp (most recent first).
    pub fn entries(&self) -> Result<Vec<SaveEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read save directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match self.read_payload(entry.path()) {
                Ok(payload) => entries.push(SaveEntry {
                    path: entry.path(),
                    name: payload.name,
                    updated_at: payload.saved_at,
                }),
                Err(err) => {
                    warn!("Failed to read save {:?}: {err}", entry.path());
                }
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    /// Persist a snapshot of the game and return the resulting entry.
    pub fn create_save(&self, name: &str, state: &GameState) -> Result<SaveEntry> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let payload = SavePayload::new(name, state);
        let file_name = format!(
            "{}_{}.json",
            sanitize_component(&payload.name),
            payload.saved_at.format("%Y%m%d%H%M%S")
        );
        let path = self.root.join(file_name);
        self.write_payload(&path, &payload)?;

        Ok(SaveEntry {
            path,
            name: payload.name,
            updated_at: payload.saved_at,
        })
    }

    /// Load the payload for the provided entry.
    pub fn load(&self, entry: &SaveEntry) -> Result<SavePayload> {
        self.read_payload(&entry.path)
    }

    /// Delete a save file.
    pub fn delete(&self, entry: &SaveEntry) -> Result<()> {
        fs::remove_file(&entry.path)
            .with_context(|| format!("failed to delete {}", entry.path.display()))
    }

    /// Load the most recent save entry, if any.
    pub fn latest(&self) -> Result<Option<SaveEntry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().next())
    }

    fn write_payload(&self, path: &Path, payload: &SavePayload) -> Result<()> {
        let serialised = serde_json::to_vec_pretty(payload)?;
        fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_payload(&self, path: impl AsRef<Path>) -> Result<SavePayload> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(payload)
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> GameState {
        let mut state = GameState::with_seed(200_000, 5.0, 11);
        state.assign_industries("Industry A", "Industry B");
        state.start().expect("start");
        state.roll_and_move().expect("roll");
        state
    }

    #[test]
    fn save_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path());
        let state = sample_state();

        let entry = manager.create_save("Evening session", &state)?;
        assert!(entry.path.exists());

        let entries = manager.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Evening session");

        let payload = manager.load(&entries[0])?;
        assert_eq!(payload.name(), "Evening session");
        let restored = payload.into_state();
        assert_eq!(restored.phase, state.phase);
        assert_eq!(restored.log, state.log);
        assert_eq!(
            restored.industries[0].position,
            state.industries[0].position
        );

        let latest = manager.latest()?.expect("expected latest entry");
        assert_eq!(latest.name, "Evening session");

        manager.delete(&entries[0])?;
        assert!(manager.entries()?.is_empty());

        Ok(())
    }

    #[test]
    fn blank_names_get_a_fallback() -> Result<()> {
        let dir = tempdir()?;
        let manager = SaveManager::new(dir.path());
        let entry = manager.create_save("   ", &sample_state())?;
        assert_eq!(entry.name, "Unnamed game");
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        let name = sanitize_component("Evening session #3!");
        assert_eq!(name, "Eveningsession3");
    }
}
