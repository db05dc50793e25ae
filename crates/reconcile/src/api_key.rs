//! Lifecycle reconciliation for the scoped API key resource.
//!
//! API keys are deliberately more restrictive than projects: there is no
//! in-place update (any change replaces the key), and import is not
//! supported because the owning project cannot be derived from a key id
//! through any exposed endpoint.

use crate::error::{Error, Result};
use crate::types::{ApiKeyRecord, ApiKeySpec};
use gateway::{CreateApiKey, Remote};

/// Reconciler for scoped API keys.
pub struct ApiKeyReconciler<'a, R: Remote + ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> ApiKeyReconciler<'a, R> {
    /// Create a reconciler over the given remote.
    #[must_use]
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    /// Create an API key in the project named by `spec`.
    ///
    /// The returned record carries the one-time `secret_key`. The caller
    /// must persist it: there is no way to retrieve the secret later.
    pub fn create(&self, spec: &ApiKeySpec) -> Result<ApiKeyRecord> {
        let req = CreateApiKey {
            note: spec.note.clone(),
        };
        let key = self.remote.create_api_key(&spec.project_id, &req)?;
        log::debug!("created API key {} in project {}", key.id, spec.project_id);
        Ok(ApiKeyRecord::from_created(&spec.project_id, key))
    }

    /// Refresh an observed API key record.
    ///
    /// The remote API exposes no single-key fetch, so this lists the
    /// project's keys and filters by id. A successful read never
    /// repopulates `secret_key`: the value captured at creation is
    /// preserved, never overwritten with an empty one. A missing key is
    /// reported as [`Error::NotFound`].
    pub fn read(&self, observed: &ApiKeyRecord) -> Result<ApiKeyRecord> {
        match self
            .remote
            .find_api_key(&observed.project_id, &observed.id)?
        {
            Some(key) => Ok(observed.refreshed(key)),
            None => Err(Error::NotFound(format!(
                "API key {} in project {}",
                observed.id, observed.project_id
            ))),
        }
    }

    /// Updating an API key is not supported by design.
    ///
    /// There is no transition from "existing" to "modified-in-place" for
    /// this resource type; the attempt itself is an error, never a silent
    /// no-op. Any change requires replacing the key.
    pub fn update(&self, _observed: &ApiKeyRecord, _spec: &ApiKeySpec) -> Result<ApiKeyRecord> {
        Err(Error::Unsupported {
            operation: "update",
            message: "API keys cannot be updated; any change requires destroying and \
                      recreating the key"
                .to_string(),
        })
    }

    /// Delete an API key.
    ///
    /// The server reports success in the response body independently of
    /// the HTTP status; an OK status with `success: false` is an
    /// invariant violation, not a no-op success.
    pub fn delete(&self, project_id: &str, key_id: &str) -> Result<()> {
        let deletion = self.remote.delete_api_key(project_id, key_id)?;
        if !deletion.success {
            return Err(Error::InvariantViolation(format!(
                "deletion of API key {key_id} returned an OK status but success=false"
            )));
        }
        log::debug!("deleted API key {key_id} in project {project_id}");
        Ok(())
    }

    /// Importing an API key is not supported.
    ///
    /// Reconstructing a key from an opaque id would require deriving its
    /// project, which no exposed endpoint allows; guessing is worse than
    /// refusing.
    pub fn import(&self, _id: &str) -> Result<ApiKeyRecord> {
        Err(Error::Unsupported {
            operation: "import",
            message: "the owning project of an API key cannot be derived from its id; \
                      recreate the key instead"
                .to_string(),
        })
    }
}
