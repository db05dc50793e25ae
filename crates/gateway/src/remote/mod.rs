//! Remote trait and implementations for the management API.
//!
//! This module provides the [`Remote`] trait, the seam through which all
//! reconciliation logic talks to the management API, and its two
//! implementations: [`http::HttpRemote`] for real calls and
//! [`MockRemote`] for tests.
//!
//! # Lookup semantics
//!
//! The remote API exposes no single-resource GET for either resource
//! type. The provided `find_*` helpers therefore list and filter by id:
//! a linear scan on every call, deliberately without memoization, since
//! remote state can change between calls.
//!
//! # Testing
//!
//! Use [`MockRemote`] for testing without network access:
//!
//! ```
//! use gateway::{CreateProject, MockRemote, Remote};
//!
//! let mock = MockRemote::new();
//! let project = mock
//!     .create_project(&CreateProject {
//!         name: "demo".to_string(),
//!         metadata: None,
//!         retention: None,
//!     })
//!     .unwrap();
//!
//! assert_eq!(mock.find_project(&project.id).unwrap().unwrap().name, "demo");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    ApiKey, ApiKeyDeletion, CreateApiKey, CreateProject, Project, UpdateProject,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Timestamp the mock assigns to created resources.
pub const MOCK_CREATED_AT: &str = "2024-01-15T00:00:00Z";
/// Timestamp the mock assigns on updates.
pub const MOCK_UPDATED_AT: &str = "2024-01-16T00:00:00Z";

/// Synchronous, authenticated access to the management API.
///
/// One call maps to one HTTP exchange; implementations perform no
/// retries, no caching, and own no state between calls. Cancellation and
/// timeout live entirely inside the single blocking call.
pub trait Remote: Send + Sync {
    /// List all projects visible to the credentials.
    fn list_projects(&self) -> Result<Vec<Project>>;

    /// Create a project and return it as stored by the server.
    ///
    /// The server may override requested values (e.g. retention policy);
    /// the returned record is authoritative.
    fn create_project(&self, req: &CreateProject) -> Result<Project>;

    /// Update a project in place and return the refreshed record.
    fn update_project(&self, id: &str, req: &UpdateProject) -> Result<Project>;

    /// Delete a project.
    ///
    /// The server accepts the deletion for asynchronous processing; a
    /// successful return does not guarantee the project is already gone.
    fn delete_project(&self, id: &str) -> Result<()>;

    /// List all API keys of a project.
    ///
    /// Entries never carry `secret_key`; it exists only in the create
    /// response.
    fn list_api_keys(&self, project_id: &str) -> Result<Vec<ApiKey>>;

    /// Create an API key and return it, including the one-time secret.
    fn create_api_key(&self, project_id: &str, req: &CreateApiKey) -> Result<ApiKey>;

    /// Delete an API key.
    ///
    /// Returns the body verbatim; the caller must check the `success`
    /// flag in addition to the HTTP status.
    fn delete_api_key(&self, project_id: &str, key_id: &str) -> Result<ApiKeyDeletion>;

    /// Look up a project by id via list-then-filter.
    fn find_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.list_projects()?.into_iter().find(|p| p.id == id))
    }

    /// Look up an API key by id via list-then-filter.
    fn find_api_key(&self, project_id: &str, key_id: &str) -> Result<Option<ApiKey>> {
        Ok(self
            .list_api_keys(project_id)?
            .into_iter()
            .find(|k| k.id == key_id))
    }
}

#[derive(Debug, Default)]
struct MockState {
    projects: Vec<Project>,
    api_keys: HashMap<String, Vec<ApiKey>>,
    next_id: u64,
    retention_override: Option<Option<u32>>,
    reject_api_key_deletion: bool,
}

/// Mock remote for testing without network access.
///
/// Stores resources in memory and assigns deterministic ids and
/// timestamps. Knobs simulate server-side behaviors the client must
/// tolerate: retention policy overrides and deletions rejected in the
/// response body.
#[derive(Debug, Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    /// Create a new empty mock remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing project.
    pub fn seed_project(&self, project: Project) {
        self.state.lock().unwrap().projects.push(project);
    }

    /// Seed an existing API key. The stored entry drops any secret, as
    /// list responses do.
    pub fn seed_api_key(&self, project_id: &str, mut key: ApiKey) {
        key.secret_key = None;
        self.state
            .lock()
            .unwrap()
            .api_keys
            .entry(project_id.to_string())
            .or_default()
            .push(key);
    }

    /// Make the server report this retention value on every subsequent
    /// create/update response, regardless of the request.
    pub fn override_retention(&self, retention_days: Option<u32>) {
        self.state.lock().unwrap().retention_override = Some(retention_days);
    }

    /// Make API key deletions return HTTP success with `success: false`.
    pub fn reject_api_key_deletions(&self) {
        self.state.lock().unwrap().reject_api_key_deletion = true;
    }

    /// Snapshot of all stored projects.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.state.lock().unwrap().projects.clone()
    }

    /// Snapshot of the stored API keys of a project.
    #[must_use]
    pub fn api_keys(&self, project_id: &str) -> Vec<ApiKey> {
        self.state
            .lock()
            .unwrap()
            .api_keys
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Remote for MockRemote {
    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.state.lock().unwrap().projects.clone())
    }

    fn create_project(&self, req: &CreateProject) -> Result<Project> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let retention_days = state
            .retention_override
            .unwrap_or(req.retention);
        let project = Project {
            id: format!("proj-{}", state.next_id),
            name: req.name.clone(),
            metadata: req.metadata.clone().unwrap_or_default(),
            retention_days,
            created_at: MOCK_CREATED_AT.to_string(),
            updated_at: MOCK_CREATED_AT.to_string(),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    fn update_project(&self, id: &str, req: &UpdateProject) -> Result<Project> {
        let mut state = self.state.lock().unwrap();
        let retention_days = state
            .retention_override
            .unwrap_or(req.retention);
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("project {id}")))?;
        project.name = req.name.clone();
        // An omitted metadata map means none is desired.
        project.metadata = req.metadata.clone().unwrap_or_default();
        project.retention_days = retention_days;
        project.updated_at = MOCK_UPDATED_AT.to_string();
        Ok(project.clone())
    }

    fn delete_project(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(Error::NotFound(format!("project {id}")));
        }
        state.api_keys.remove(id);
        Ok(())
    }

    fn list_api_keys(&self, project_id: &str) -> Result<Vec<ApiKey>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .api_keys
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create_api_key(&self, project_id: &str, req: &CreateApiKey) -> Result<ApiKey> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let n = state.next_id;
        let key = ApiKey {
            id: format!("key-{n}"),
            created_at: MOCK_CREATED_AT.to_string(),
            expires_at: None,
            last_used_at: None,
            note: req.note.clone(),
            public_key: format!("pk-lm-{n}"),
            secret_key: Some(format!("sk-lm-secret-{n}")),
            display_secret_key: format!("sk-lm-...{n:04}"),
        };
        // The stored copy has no secret: list responses never carry it.
        let mut stored = key.clone();
        stored.secret_key = None;
        state
            .api_keys
            .entry(project_id.to_string())
            .or_default()
            .push(stored);
        Ok(key)
    }

    fn delete_api_key(&self, project_id: &str, key_id: &str) -> Result<ApiKeyDeletion> {
        let mut state = self.state.lock().unwrap();
        if state.reject_api_key_deletion {
            return Ok(ApiKeyDeletion { success: false });
        }
        let keys = state
            .api_keys
            .get_mut(project_id)
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;
        let before = keys.len();
        keys.retain(|k| k.id != key_id);
        if keys.len() == before {
            return Err(Error::NotFound(format!("API key {key_id}")));
        }
        Ok(ApiKeyDeletion { success: true })
    }
}
