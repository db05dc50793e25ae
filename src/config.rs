//! Desired-state configuration file.
//!
//! `lumetry.toml` declares the projects and API keys that should exist,
//! plus optional credentials (environment variables win absence). API
//! keys reference their project by the entry name, not by remote id:
//! ids are server-assigned and live only in the state file.

use anyhow::{Context, Result, bail};
use gateway::Credentials;
use reconcile::{ApiKeySpec, ProjectSpec};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Root of the desired-state configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Connection settings; every value can instead come from the
    /// environment.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Projects that should exist.
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,

    /// API keys that should exist.
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

/// Connection settings for the management API.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    pub api_host: Option<String>,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
}

/// One desired project.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectEntry {
    /// Entry name; doubles as the project name on the remote.
    pub name: String,

    /// Project metadata. Values must be strings; anything else is
    /// rejected by validation, not coerced.
    #[serde(default)]
    pub metadata: Option<toml::value::Table>,

    /// Retention in days. Bounds are enforced server-side.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl ProjectEntry {
    /// Desired-state spec for this entry.
    ///
    /// Metadata values are carried over as JSON values so that
    /// validation (strings only) happens in the reconciliation layer,
    /// with a field-level error message.
    pub fn spec(&self) -> Result<ProjectSpec> {
        let metadata = match &self.metadata {
            None => None,
            Some(table) => {
                let mut map = BTreeMap::new();
                for (key, value) in table {
                    let value = serde_json::to_value(value).with_context(|| {
                        format!("unrepresentable metadata value for key {key}")
                    })?;
                    map.insert(key.clone(), value);
                }
                Some(map)
            }
        };
        Ok(ProjectSpec {
            name: self.name.clone(),
            metadata,
            retention_days: self.retention_days,
        })
    }
}

/// One desired API key.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyEntry {
    /// Entry name, used as the state-file key.
    pub name: String,

    /// Name of the `[[projects]]` entry the key belongs to.
    pub project: String,

    /// Optional note stored with the key. Immutable: changing it
    /// replaces the key.
    #[serde(default)]
    pub note: Option<String>,
}

impl ApiKeyEntry {
    /// Desired-state spec, bound to a resolved remote project id.
    pub fn spec(&self, project_id: &str) -> ApiKeySpec {
        ApiKeySpec {
            project_id: project_id.to_string(),
            note: self.note.clone(),
        }
    }
}

impl WorkspaceConfig {
    /// Load and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve API credentials, falling back to the environment.
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::resolve(
            self.credentials.api_host.clone(),
            self.credentials.public_key.clone(),
            self.credentials.secret_key.clone(),
        )
        .map_err(Into::into)
    }

    /// Find a project entry by name.
    pub fn find_project(&self, name: &str) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.name == name)
    }

    fn validate(&self) -> Result<()> {
        let mut project_names = HashSet::new();
        for project in &self.projects {
            if project.name.is_empty() {
                bail!("a [[projects]] entry has an empty name");
            }
            if !project_names.insert(project.name.as_str()) {
                bail!("duplicate project entry: {}", project.name);
            }
        }

        let mut key_names = HashSet::new();
        for key in &self.api_keys {
            if key.name.is_empty() {
                bail!("an [[api_keys]] entry has an empty name");
            }
            if !key_names.insert(key.name.as_str()) {
                bail!("duplicate API key entry: {}", key.name);
            }
            if !project_names.contains(key.project.as_str()) {
                bail!(
                    "API key {} references unknown project {}",
                    key.name,
                    key.project
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<WorkspaceConfig> {
        let config: WorkspaceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config() {
        let config = parse(
            r#"
            [[projects]]
            name = "demo"
            "#,
        )
        .unwrap();
        assert_eq!(config.projects.len(), 1);
        assert!(config.api_keys.is_empty());

        let spec = config.projects[0].spec().unwrap();
        assert_eq!(spec.name, "demo");
        assert_eq!(spec.metadata, None);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [credentials]
            api_host = "https://api.example.com"

            [[projects]]
            name = "demo"
            retention_days = 30
            [projects.metadata]
            team = "ml"

            [[api_keys]]
            name = "ci"
            project = "demo"
            note = "CI pipeline"
            "#,
        )
        .unwrap();

        let spec = config.projects[0].spec().unwrap();
        assert_eq!(spec.retention_days, Some(30));
        let metadata = spec.metadata.unwrap();
        assert_eq!(metadata["team"], serde_json::json!("ml"));

        let key_spec = config.api_keys[0].spec("proj-1");
        assert_eq!(key_spec.project_id, "proj-1");
        assert_eq!(key_spec.note.as_deref(), Some("CI pipeline"));
    }

    #[test]
    fn test_non_string_metadata_survives_parsing() {
        // Parsing keeps the raw value; the reconciliation layer rejects it.
        let config = parse(
            r#"
            [[projects]]
            name = "demo"
            [projects.metadata]
            build = 42
            "#,
        )
        .unwrap();
        let spec = config.projects[0].spec().unwrap();
        assert_eq!(spec.metadata.unwrap()["build"], serde_json::json!(42));
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let err = parse(
            r#"
            [[projects]]
            name = "demo"
            [[projects]]
            name = "demo"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate project"));
    }

    #[test]
    fn test_unknown_project_reference_rejected() {
        let err = parse(
            r#"
            [[api_keys]]
            name = "ci"
            project = "ghost"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown project"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse(
            r#"
            [[projects]]
            name = "demo"
            colour = "red"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("colour") || err.to_string().contains("unknown"));
    }
}
