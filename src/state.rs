//! Observed-state file.
//!
//! The host side of the reconciliation contract: observed records are
//! persisted between runs in a JSON file keyed by configuration entry
//! name. This file is the only place a key's one-time `secret_key`
//! survives; the remote never returns it again.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::{ApiKeyRecord, ProjectRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Tracked observed state of all managed resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Observed projects, keyed by configuration entry name.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,

    /// Observed API keys, keyed by configuration entry name.
    #[serde(default)]
    pub api_keys: BTreeMap<String, ApiKeyRecord>,

    /// Last time the state was written.
    pub last_updated: DateTime<Utc>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            api_keys: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl StateFile {
    /// Load state from disk, or return an empty state if the file does
    /// not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("state file {} does not exist, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk, stamping the update time.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;
        log::debug!("saved state to {}", path.display());
        Ok(())
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.api_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StateFile {
        let mut state = StateFile::default();
        state.projects.insert(
            "demo".to_string(),
            ProjectRecord {
                id: "proj-1".to_string(),
                name: "demo".to_string(),
                metadata: BTreeMap::new(),
                retention_days: Some(30),
                created_at: "2024-01-15T00:00:00Z".to_string(),
                updated_at: "2024-01-15T00:00:00Z".to_string(),
            },
        );
        state.api_keys.insert(
            "ci".to_string(),
            ApiKeyRecord {
                id: "key-1".to_string(),
                project_id: "proj-1".to_string(),
                note: Some("CI pipeline".to_string()),
                public_key: "pk-lm-1".to_string(),
                secret_key: Some("sk-lm-secret".to_string()),
                display_secret_key: "sk-lm-...cret".to_string(),
                created_at: "2024-01-15T00:00:00Z".to_string(),
            },
        );
        state
    }

    #[test]
    fn test_missing_file_yields_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::load(&dir.path().join("missing.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = sample_state();
        state.save(&path).unwrap();

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(
            loaded.api_keys["ci"].secret_key.as_deref(),
            Some("sk-lm-secret")
        );
        assert_eq!(loaded.projects["demo"].retention_days, Some(30));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        sample_state().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(StateFile::load(&path).is_err());
    }
}
