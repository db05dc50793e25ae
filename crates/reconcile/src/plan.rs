//! Drift classification.
//!
//! Given a desired spec and the last observed record, decide which
//! lifecycle operation moves observed state toward desired state. Both
//! resource types share one classification routine driven by the field
//! tables in [`crate::schema`]: a changed field that updates in place
//! contributes to an `Update`, a changed field that cannot forces a
//! `Replace` (destroy then recreate).

use crate::error::Result;
use crate::schema::{self, API_KEY_FIELDS, FieldSpec, PROJECT_FIELDS};
use crate::types::{ApiKeyRecord, ApiKeySpec, ProjectRecord, ProjectSpec};

/// Operation needed to converge one resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No observed record exists; the resource must be created.
    Create,
    /// Observed state differs in updatable fields only.
    Update {
        /// Changed fields, in field-table order.
        fields: Vec<&'static str>,
    },
    /// Observed state differs in a field that cannot change in place;
    /// the resource must be destroyed and recreated.
    Replace {
        /// First changed field that forces the replacement.
        field: &'static str,
    },
    /// Observed state already matches desired state.
    NoChange,
}

impl Action {
    /// Whether this action mutates the remote.
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Classify changed fields against a field table.
fn classify(fields: &[FieldSpec], changed: Vec<&'static str>) -> Action {
    if changed.is_empty() {
        return Action::NoChange;
    }
    let mut updates = Vec::new();
    for name in changed {
        match schema::field(fields, name) {
            Some(spec) if spec.mutability.updatable() => updates.push(name),
            _ => return Action::Replace { field: name },
        }
    }
    Action::Update { fields: updates }
}

/// Plan the next operation for a project.
///
/// Fails fast on invalid desired state (non-string metadata values)
/// before anything touches the network.
pub fn plan_project(spec: &ProjectSpec, observed: Option<&ProjectRecord>) -> Result<Action> {
    let metadata = spec.validated_metadata()?;
    let Some(observed) = observed else {
        return Ok(Action::Create);
    };

    let mut changed = Vec::new();
    if spec.name != observed.name {
        changed.push("name");
    }
    // An absent desired map and an observed empty map agree: nothing there.
    if metadata.unwrap_or_default() != observed.metadata {
        changed.push("metadata");
    }
    if spec.retention_days != observed.retention_days {
        changed.push("retention_days");
    }
    Ok(classify(PROJECT_FIELDS, changed))
}

/// Plan the next operation for an API key.
///
/// Both comparable fields are immutable, so any drift yields `Replace`.
#[must_use]
pub fn plan_api_key(spec: &ApiKeySpec, observed: Option<&ApiKeyRecord>) -> Action {
    let Some(observed) = observed else {
        return Action::Create;
    };

    let mut changed = Vec::new();
    if spec.project_id != observed.project_id {
        changed.push("project_id");
    }
    if spec.note != observed.note {
        changed.push("note");
    }
    classify(API_KEY_FIELDS, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn observed_project() -> ProjectRecord {
        ProjectRecord {
            id: "proj-1".to_string(),
            name: "demo".to_string(),
            metadata: BTreeMap::new(),
            retention_days: None,
            created_at: "2024-01-15T00:00:00Z".to_string(),
            updated_at: "2024-01-15T00:00:00Z".to_string(),
        }
    }

    fn observed_key() -> ApiKeyRecord {
        ApiKeyRecord {
            id: "key-1".to_string(),
            project_id: "proj-1".to_string(),
            note: Some("ci".to_string()),
            public_key: "pk-lm-1".to_string(),
            secret_key: Some("sk-lm-secret".to_string()),
            display_secret_key: "sk-lm-...0001".to_string(),
            created_at: "2024-01-15T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_missing_project_plans_create() {
        let action = plan_project(&ProjectSpec::named("demo"), None).unwrap();
        assert_eq!(action, Action::Create);
        assert!(action.is_change());
    }

    #[test]
    fn test_matching_project_plans_no_change() {
        let action = plan_project(&ProjectSpec::named("demo"), Some(&observed_project())).unwrap();
        assert_eq!(action, Action::NoChange);
        assert!(!action.is_change());
    }

    #[test]
    fn test_renamed_project_plans_update() {
        let action =
            plan_project(&ProjectSpec::named("renamed"), Some(&observed_project())).unwrap();
        assert_eq!(
            action,
            Action::Update {
                fields: vec!["name"]
            }
        );
    }

    #[test]
    fn test_absent_and_empty_desired_metadata_agree_with_empty_observed() {
        let absent = ProjectSpec::named("demo");
        assert_eq!(
            plan_project(&absent, Some(&observed_project())).unwrap(),
            Action::NoChange
        );

        let empty = ProjectSpec {
            metadata: Some(BTreeMap::new()),
            ..ProjectSpec::named("demo")
        };
        assert_eq!(
            plan_project(&empty, Some(&observed_project())).unwrap(),
            Action::NoChange
        );
    }

    #[test]
    fn test_dropped_retention_is_drift() {
        let mut observed = observed_project();
        observed.retention_days = Some(30);
        let action = plan_project(&ProjectSpec::named("demo"), Some(&observed)).unwrap();
        assert_eq!(
            action,
            Action::Update {
                fields: vec!["retention_days"]
            }
        );
    }

    #[test]
    fn test_invalid_metadata_fails_planning() {
        let spec = ProjectSpec {
            metadata: Some(BTreeMap::from([("n".to_string(), json!(1))])),
            ..ProjectSpec::named("demo")
        };
        assert!(plan_project(&spec, Some(&observed_project())).is_err());
    }

    #[test]
    fn test_missing_key_plans_create() {
        let spec = ApiKeySpec {
            project_id: "proj-1".to_string(),
            note: None,
        };
        assert_eq!(plan_api_key(&spec, None), Action::Create);
    }

    #[test]
    fn test_matching_key_plans_no_change() {
        let spec = ApiKeySpec {
            project_id: "proj-1".to_string(),
            note: Some("ci".to_string()),
        };
        assert_eq!(plan_api_key(&spec, Some(&observed_key())), Action::NoChange);
    }

    #[test]
    fn test_moved_key_plans_replace() {
        let spec = ApiKeySpec {
            project_id: "proj-2".to_string(),
            note: Some("ci".to_string()),
        };
        assert_eq!(
            plan_api_key(&spec, Some(&observed_key())),
            Action::Replace {
                field: "project_id"
            }
        );
    }

    #[test]
    fn test_changed_note_plans_replace_not_update() {
        let spec = ApiKeySpec {
            project_id: "proj-1".to_string(),
            note: Some("new note".to_string()),
        };
        assert_eq!(
            plan_api_key(&spec, Some(&observed_key())),
            Action::Replace { field: "note" }
        );
    }
}
