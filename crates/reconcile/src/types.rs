//! Desired and observed state of managed resources.
//!
//! A *spec* is the caller-declared target configuration for one resource
//! instance; a *record* is the configuration as last confirmed from the
//! remote system. Reconcilers take specs and records as input and return
//! new records as output; nothing here is cached between calls, and the
//! host owns persistence of records between steps.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of a project.
///
/// `metadata` keeps the null-vs-present distinction of the source
/// configuration: `None` means the caller declared no metadata at all,
/// `Some` of an empty map means an explicitly empty mapping. Values
/// arrive as JSON values so that non-string values can be rejected
/// rather than silently coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project name.
    pub name: String,
    /// Desired metadata mapping, replaced wholesale on update.
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
    /// Desired retention in days. The server enforces bounds; the client
    /// performs no bound-checking.
    pub retention_days: Option<u32>,
}

impl ProjectSpec {
    /// Create a spec with just a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
            retention_days: None,
        }
    }

    /// Validate metadata values, keeping the null-vs-present state.
    ///
    /// Every value must be a JSON string; the first non-string value
    /// fails the whole step before any network call.
    pub fn validated_metadata(&self) -> Result<Option<BTreeMap<String, String>>> {
        let Some(metadata) = &self.metadata else {
            return Ok(None);
        };
        let mut out = BTreeMap::new();
        for (key, value) in metadata {
            match value.as_str() {
                Some(s) => {
                    out.insert(key.clone(), s.to_string());
                }
                None => {
                    return Err(Error::validation(
                        format!("metadata.{key}"),
                        "metadata values must be strings",
                    ));
                }
            }
        }
        Ok(Some(out))
    }
}

/// Observed state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Server-assigned identifier; the sole key used for addressing.
    pub id: String,
    /// Name as stored by the server.
    pub name: String,
    /// Metadata as stored by the server.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Retention as stored by the server, which may differ from the
    /// requested value if server-side policy overrides it.
    pub retention_days: Option<u32>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last-update timestamp.
    pub updated_at: String,
}

impl From<gateway::Project> for ProjectRecord {
    fn from(project: gateway::Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            metadata: project.metadata,
            retention_days: project.retention_days,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Desired state of a scoped API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeySpec {
    /// Project the key belongs to. Immutable: a change forces
    /// replacement of the key.
    pub project_id: String,
    /// Optional note. Also immutable-by-replacement.
    pub note: Option<String>,
}

/// Observed state of a scoped API key.
///
/// `secret_key` is populated exactly once, from the create response, and
/// is preserved verbatim afterwards: list responses structurally lack the
/// secret, and a refresh must never clear a previously captured value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Server-assigned identifier.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Note as stored by the server.
    pub note: Option<String>,
    /// Public half of the credential pair.
    pub public_key: String,
    /// One-time secret captured at creation, if the caller still holds it.
    pub secret_key: Option<String>,
    /// Redacted display form of the secret.
    pub display_secret_key: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl ApiKeyRecord {
    /// Build the observed record from a create response.
    #[must_use]
    pub fn from_created(project_id: impl Into<String>, key: gateway::ApiKey) -> Self {
        Self {
            id: key.id,
            project_id: project_id.into(),
            note: key.note,
            public_key: key.public_key,
            secret_key: key.secret_key,
            display_secret_key: key.display_secret_key,
            created_at: key.created_at,
        }
    }

    /// Fold a list-response entry into this record.
    ///
    /// Refreshes everything the list carries but keeps the previously
    /// captured `secret_key`; the write-once secret is never overwritten
    /// with an empty value.
    #[must_use]
    pub fn refreshed(&self, key: gateway::ApiKey) -> Self {
        Self {
            id: key.id,
            project_id: self.project_id.clone(),
            note: key.note,
            public_key: key.public_key,
            secret_key: key.secret_key.or_else(|| self.secret_key.clone()),
            display_secret_key: key.display_secret_key,
            created_at: key.created_at,
        }
    }
}
