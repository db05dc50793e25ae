//! Wire types for the management API.
//!
//! These structs mirror the JSON bodies exchanged with the remote API
//! (camelCase field names). Request types keep the null-vs-present
//! distinction: an `Option` field set to `None` is omitted from the body,
//! while `Some` of an empty map is sent as `{}`; the server treats the
//! two differently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A project as reported by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Server-assigned identifier, stable for the project's lifetime.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Project metadata. Always replaced wholesale on update.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Data retention in days. `None` means no retention policy.
    pub retention_days: Option<u32>,
    /// Creation timestamp (server clock).
    pub created_at: String,
    /// Last-update timestamp (server clock).
    pub updated_at: String,
}

/// Response envelope of the project list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
}

/// Body of a project create request.
///
/// The wire field for retention is `retention`; the server reports the
/// stored value back as `retentionDays`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<u32>,
}

/// Body of a project update request. Same shape as creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<u32>,
}

/// A scoped API key as reported by the management API.
///
/// `secret_key` is only ever present in the create response; list
/// responses structurally omit it. `display_secret_key` (a redacted
/// form) is present in both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// Server-assigned identifier.
    pub id: String,
    /// Creation timestamp (server clock).
    pub created_at: String,
    /// Expiry timestamp, if the key expires.
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Timestamp of last use, if any.
    #[serde(default)]
    pub last_used_at: Option<String>,
    /// Optional caller-supplied note.
    #[serde(default)]
    pub note: Option<String>,
    /// Public half of the credential pair.
    pub public_key: String,
    /// Secret half of the credential pair. Emitted exactly once, at
    /// creation; never retrievable afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Redacted display form of the secret.
    #[serde(default)]
    pub display_secret_key: String,
}

/// Response envelope of the API key list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyList {
    pub api_keys: Vec<ApiKey>,
}

/// Body of an API key create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateApiKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body of an API key delete response.
///
/// The server reports success in the body independently of the HTTP
/// status; both must be checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyDeletion {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_omits_absent_fields() {
        let req = CreateProject {
            name: "demo".to_string(),
            metadata: None,
            retention: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"name": "demo"}));
    }

    #[test]
    fn test_create_project_sends_empty_metadata() {
        // None and Some(empty) are different requests.
        let req = CreateProject {
            name: "demo".to_string(),
            metadata: Some(BTreeMap::new()),
            retention: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"name": "demo", "metadata": {}}));
    }

    #[test]
    fn test_update_project_retention_wire_name() {
        let req = UpdateProject {
            name: "demo".to_string(),
            metadata: None,
            retention: Some(30),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["retention"], 30);
        assert!(json.get("retentionDays").is_none());
    }

    #[test]
    fn test_project_decodes_null_retention() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "demo",
            "metadata": {},
            "retentionDays": null,
            "createdAt": "2024-01-15T00:00:00Z",
            "updatedAt": "2024-01-15T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(project.retention_days, None);
        assert!(project.metadata.is_empty());
    }

    #[test]
    fn test_api_key_list_entry_has_no_secret() {
        // List responses never carry secretKey.
        let list: ApiKeyList = serde_json::from_value(serde_json::json!({
            "apiKeys": [{
                "id": "k1",
                "createdAt": "2024-01-15T00:00:00Z",
                "expiresAt": null,
                "lastUsedAt": null,
                "note": "ci",
                "publicKey": "pk-lm-1",
                "displaySecretKey": "sk-lm-...abcd"
            }]
        }))
        .unwrap();
        assert_eq!(list.api_keys.len(), 1);
        assert_eq!(list.api_keys[0].secret_key, None);
        assert_eq!(list.api_keys[0].display_secret_key, "sk-lm-...abcd");
    }

    #[test]
    fn test_api_key_create_response_carries_secret() {
        let key: ApiKey = serde_json::from_value(serde_json::json!({
            "id": "k1",
            "createdAt": "2024-01-15T00:00:00Z",
            "note": null,
            "publicKey": "pk-lm-1",
            "secretKey": "sk-lm-secret",
            "displaySecretKey": "sk-lm-...cret"
        }))
        .unwrap();
        assert_eq!(key.secret_key.as_deref(), Some("sk-lm-secret"));
    }

    #[test]
    fn test_create_api_key_without_note_is_empty_object() {
        let req = CreateApiKey::default();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_api_key_deletion_flag() {
        let rejected: ApiKeyDeletion = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!rejected.success);
    }
}
