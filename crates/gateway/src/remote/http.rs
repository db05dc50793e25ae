//! HTTP implementation of the [`Remote`] trait.
//!
//! Wraps a blocking `ureq` agent with HTTP Basic authentication and the
//! fixed endpoint table of the management API. Every call is a single
//! request with a bounded deadline; there is no retry and no caching.

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::remote::Remote;
use crate::types::{
    ApiKey, ApiKeyDeletion, ApiKeyList, CreateApiKey, CreateProject, Project, ProjectList,
    UpdateProject,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-call deadline. Timeouts surface as transport errors; the caller
/// decides whether to retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking management API client.
///
/// Authentication never varies per call: the credential pair supplied at
/// construction is attached to every request.
///
/// # Example
///
/// ```no_run
/// use gateway::{Credentials, HttpRemote, Remote};
///
/// let credentials = Credentials::new("https://api.example.com", "pk-...", "sk-...");
/// let remote = HttpRemote::new(&credentials);
/// let projects = remote.list_projects().unwrap();
/// println!("{} projects", projects.len());
/// ```
pub struct HttpRemote {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without a trailing slash.
    api_host: String,
    /// Precomputed `Authorization` header value.
    auth_header: String,
}

impl HttpRemote {
    /// Create a client for the given credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .new_agent();
        Self {
            agent,
            api_host: credentials.api_host.clone(),
            auth_header: basic_auth(&credentials.public_key, &credentials.secret_key),
        }
    }

    /// Get the configured API host.
    #[must_use]
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    fn projects_url(&self) -> String {
        format!("{}/api/public/organizations/projects", self.api_host)
    }

    fn create_project_url(&self) -> String {
        format!("{}/api/public/projects", self.api_host)
    }

    fn project_url(&self, id: &str) -> String {
        format!("{}/api/public/projects/{}", self.api_host, id)
    }

    fn api_keys_url(&self, project_id: &str) -> String {
        format!("{}/api/public/projects/{}/apiKeys", self.api_host, project_id)
    }

    fn api_key_url(&self, project_id: &str, key_id: &str) -> String {
        format!(
            "{}/api/public/projects/{}/apiKeys/{}",
            self.api_host, project_id, key_id
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &self.auth_header)
            .call()?;
        decode_body(&mut response)
    }

    fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        url: &str,
        body: &B,
        expected: &[u16],
    ) -> Result<T> {
        log::debug!("{method} {url}");
        let request = match method {
            "PUT" => self.agent.put(url),
            _ => self.agent.post(url),
        };
        let mut response = request
            .header("Authorization", &self.auth_header)
            .send_json(body)?;
        let status = response.status().as_u16();
        if !expected.contains(&status) {
            return Err(Error::UnexpectedStatus {
                expected: expected[0],
                status,
            });
        }
        decode_body(&mut response)
    }
}

fn decode_body<T: DeserializeOwned>(response: &mut ureq::http::Response<ureq::Body>) -> Result<T> {
    let text = response.body_mut().read_to_string()?;
    serde_json::from_str(&text).map_err(Into::into)
}

fn basic_auth(public_key: &str, secret_key: &str) -> String {
    let pair = format!("{public_key}:{secret_key}");
    format!("Basic {}", STANDARD.encode(pair.as_bytes()))
}

impl Remote for HttpRemote {
    fn list_projects(&self) -> Result<Vec<Project>> {
        let list: ProjectList = self.get_json(&self.projects_url())?;
        Ok(list.projects)
    }

    fn create_project(&self, req: &CreateProject) -> Result<Project> {
        // The create endpoint answers 200 or 201 depending on version.
        self.send_json("POST", &self.create_project_url(), req, &[201, 200])
    }

    fn update_project(&self, id: &str, req: &UpdateProject) -> Result<Project> {
        self.send_json("PUT", &self.project_url(id), req, &[200])
    }

    fn delete_project(&self, id: &str) -> Result<()> {
        let url = self.project_url(id);
        log::debug!("DELETE {url}");
        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &self.auth_header)
            .call()?;
        let status = response.status().as_u16();
        // Deletion is accepted for asynchronous processing.
        if status != 202 {
            return Err(Error::UnexpectedStatus {
                expected: 202,
                status,
            });
        }
        Ok(())
    }

    fn list_api_keys(&self, project_id: &str) -> Result<Vec<ApiKey>> {
        let list: ApiKeyList = self.get_json(&self.api_keys_url(project_id))?;
        Ok(list.api_keys)
    }

    fn create_api_key(&self, project_id: &str, req: &CreateApiKey) -> Result<ApiKey> {
        self.send_json("POST", &self.api_keys_url(project_id), req, &[201])
    }

    fn delete_api_key(&self, project_id: &str, key_id: &str) -> Result<ApiKeyDeletion> {
        let url = self.api_key_url(project_id, key_id);
        log::debug!("DELETE {url}");
        let mut response = self
            .agent
            .delete(&url)
            .header("Authorization", &self.auth_header)
            .call()?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::UnexpectedStatus {
                expected: 200,
                status,
            });
        }
        decode_body(&mut response)
    }
}
