use crate::domain::model::StateMap;
use crate::domain::repository::{Result, StateRepository};
use std::fs;
use std::path::{Path, PathBuf};

/// Circuit-breaker state stored as a pretty-printed JSON object keyed by username
pub struct JsonStateRepository {
    path: PathBuf,
}

impl JsonStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<StateMap> {
        let content = fs::read_to_string(&self.path)?;
        let state: StateMap = serde_json::from_str(&content)?;
        Ok(state)
    }

    /// Write via temp file + rename so a kill mid-write never truncates the store
    fn write_atomic(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl StateRepository for JsonStateRepository {
    fn load(&self) -> StateMap {
        if !self.path.exists() {
            tracing::debug!("No state file at {:?}, starting empty", self.path);
            return StateMap::new();
        }

        match self.read() {
            Ok(state) => {
                tracing::debug!("Loaded {} account state(s) from {:?}", state.len(), self.path);
                state
            }
            Err(e) => {
                tracing::warn!("Unreadable state file {:?}: {}, starting empty", self.path, e);
                StateMap::new()
            }
        }
    }

    fn save(&self, state: &StateMap) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(state)?;
        buf.push('\n');
        self.write_atomic(&buf)?;
        tracing::trace!("Saved {} account state(s) to {:?}", state.len(), self.path);
        Ok(())
    }
}
