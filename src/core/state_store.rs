use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::{PriceState, ProductRule};
use crate::utils::error::AppError;

/// Reads and writes the last-observed prices (`state.json`).
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty state: the first run bootstraps it.
    pub fn load_state(&self) -> Result<PriceState, AppError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet");
            return Ok(PriceState::new());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|source| AppError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Writes to a sibling temp file, then renames it over the state file.
    pub fn save_state(&self, state: &PriceState) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), entries = state.len(), "Saved price state");
        Ok(())
    }

    /// Drops state entries whose rule no longer exists. Returns the removed names.
    pub fn prune(&self, rules: &[ProductRule]) -> Result<Vec<String>, AppError> {
        let mut state = self.load_state()?;
        let orphans: Vec<String> = state
            .keys()
            .filter(|name| !rules.iter().any(|r| &r.name == *name))
            .cloned()
            .collect();

        if orphans.is_empty() {
            return Ok(orphans);
        }

        for name in &orphans {
            state.remove(name);
        }
        self.save_state(&state)?;
        info!(removed = orphans.len(), "Pruned orphaned state entries");
        Ok(orphans)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("state.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
