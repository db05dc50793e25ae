//! Lifecycle reconciliation for the project resource.

use crate::error::{Error, Result};
use crate::schema::{self, PROJECT_FIELDS};
use crate::types::{ProjectRecord, ProjectSpec};
use gateway::{CreateProject, Remote, UpdateProject};

/// Reconciler for analytics projects.
///
/// Translates lifecycle steps into management API calls and folds the
/// responses back into observed records. Holds only a reference to the
/// injected remote; no state survives between calls.
pub struct ProjectReconciler<'a, R: Remote + ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> ProjectReconciler<'a, R> {
    /// Create a reconciler over the given remote.
    #[must_use]
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    /// Create the project described by `spec`.
    ///
    /// Desired metadata is validated (string values only) before any
    /// network call. The returned record is populated entirely from the
    /// server response, including the retention value the server
    /// actually stored, which may differ from the request.
    pub fn create(&self, spec: &ProjectSpec) -> Result<ProjectRecord> {
        let metadata = spec.validated_metadata()?;
        let req = CreateProject {
            name: spec.name.clone(),
            metadata,
            retention: spec.retention_days,
        };
        let project = self.remote.create_project(&req)?;
        log::debug!("created project {} ({})", project.name, project.id);
        Ok(project.into())
    }

    /// Read the project with the given id.
    ///
    /// The remote API exposes no single-project fetch, so this lists all
    /// projects and filters by id. A missing project is reported as
    /// [`Error::NotFound`]; the caller should treat it as already
    /// destroyed, not retry.
    pub fn read(&self, id: &str) -> Result<ProjectRecord> {
        match self.remote.find_project(id)? {
            Some(project) => Ok(project.into()),
            None => Err(Error::NotFound(format!("project {id}"))),
        }
    }

    /// Update the project in place to match `spec`.
    ///
    /// All desired fields are sent unconditionally: "no metadata" and
    /// "empty metadata" are distinct requests. Changed fields are checked
    /// against the field table first; a change to a non-updatable field
    /// is refused before any network call.
    pub fn update(&self, observed: &ProjectRecord, spec: &ProjectSpec) -> Result<ProjectRecord> {
        let metadata = spec.validated_metadata()?;
        schema::check_update(PROJECT_FIELDS, &changed_fields(observed, spec, &metadata))?;

        let req = UpdateProject {
            name: spec.name.clone(),
            metadata,
            retention: spec.retention_days,
        };
        let project = self.remote.update_project(&observed.id, &req)?;
        log::debug!("updated project {}", project.id);
        Ok(project.into())
    }

    /// Delete the project with the given id.
    ///
    /// The server accepts the deletion for asynchronous processing: a
    /// successful return means accepted, not gone, and a subsequent read
    /// may still observe the project for a bounded grace period.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.remote.delete_project(id)?;
        log::debug!("deletion of project {id} accepted");
        Ok(())
    }

    /// Reconstruct the observed record of an existing project from its id.
    pub fn import(&self, id: &str) -> Result<ProjectRecord> {
        self.read(id)
    }
}

/// Names of desired fields that differ from the observed record.
fn changed_fields(
    observed: &ProjectRecord,
    spec: &ProjectSpec,
    metadata: &Option<std::collections::BTreeMap<String, String>>,
) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if spec.name != observed.name {
        changed.push("name");
    }
    // For drift purposes an absent desired map means "nothing desired".
    let desired_metadata = metadata.clone().unwrap_or_default();
    if desired_metadata != observed.metadata {
        changed.push("metadata");
    }
    if spec.retention_days != observed.retention_days {
        changed.push("retention_days");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockRemote;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn spec_with_metadata(name: &str, pairs: &[(&str, serde_json::Value)]) -> ProjectSpec {
        ProjectSpec {
            name: name.to_string(),
            metadata: Some(
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
            ),
            retention_days: None,
        }
    }

    #[test]
    fn test_create_then_read_round_trip() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        let created = reconciler.create(&ProjectSpec::named("demo")).unwrap();
        assert_eq!(created.name, "demo");
        assert!(!created.id.is_empty());
        assert_eq!(created.retention_days, None);

        let read = reconciler.read(&created.id).unwrap();
        assert_eq!(read, created);
    }

    #[test]
    fn test_read_is_idempotent() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);
        let created = reconciler.create(&ProjectSpec::named("demo")).unwrap();

        let first = reconciler.read(&created.id).unwrap();
        let second = reconciler.read(&created.id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_missing_project_is_not_found() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        let err = reconciler.read("proj-404").unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_delete_missing_project_is_not_found() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        let err = reconciler.delete("proj-404").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_rejects_non_string_metadata_before_any_call() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        let spec = spec_with_metadata("demo", &[("count", json!(3))]);
        let err = reconciler.create(&spec).unwrap_err();
        assert!(format!("{}", err).contains("metadata.count"));
        // Fail fast: nothing was created remotely.
        assert!(mock.projects().is_empty());
    }

    #[test]
    fn test_update_replaces_metadata_wholesale() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        let created = reconciler
            .create(&spec_with_metadata(
                "demo",
                &[("a", json!("1")), ("b", json!("2"))],
            ))
            .unwrap();

        let updated = reconciler
            .update(&created, &spec_with_metadata("demo", &[("a", json!("3"))]))
            .unwrap();

        let expected: BTreeMap<String, String> =
            BTreeMap::from([("a".to_string(), "3".to_string())]);
        assert_eq!(updated.metadata, expected);
    }

    #[test]
    fn test_retention_is_not_bound_checked_by_client() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);

        // 1 is below the server-side minimum of 3; the client forwards it
        // anyway and adopts whatever the server stores.
        mock.override_retention(Some(3));
        let spec = ProjectSpec {
            retention_days: Some(1),
            ..ProjectSpec::named("demo")
        };
        let created = reconciler.create(&spec).unwrap();
        assert_eq!(created.retention_days, Some(3));
    }

    #[test]
    fn test_update_adopts_server_retention() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);
        let created = reconciler.create(&ProjectSpec::named("demo")).unwrap();

        mock.override_retention(Some(30));
        let spec = ProjectSpec {
            retention_days: Some(1),
            ..ProjectSpec::named("demo")
        };
        let updated = reconciler.update(&created, &spec).unwrap();
        assert_eq!(updated.retention_days, Some(30));
    }

    #[test]
    fn test_import_is_read_by_id() {
        let mock = MockRemote::new();
        let reconciler = ProjectReconciler::new(&mock);
        let created = reconciler.create(&ProjectSpec::named("demo")).unwrap();

        let imported = reconciler.import(&created.id).unwrap();
        assert_eq!(imported, created);

        assert!(reconciler.import("proj-404").unwrap_err().is_not_found());
    }
}
