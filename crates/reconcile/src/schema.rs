//! Per-resource field descriptors.
//!
//! Every field of a managed resource carries a mutability class. The
//! tables here are the single source of truth consulted by both
//! reconcilers and by drift planning: which desired-state fields may flow
//! into an update request, and which force a replacement (destroy then
//! recreate). No field is ever silently dropped from validation.

use crate::error::{Error, Result};

/// Mutability class of a resource field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Caller must supply a value.
    Required {
        /// Whether a change to this field forces replacement instead of
        /// an in-place update.
        forces_replacement: bool,
    },
    /// Optional; changes flow into update requests.
    OptionalMutable,
    /// Optional; any change forces replacement.
    OptionalImmutable,
    /// Server-assigned, read-only.
    Computed,
    /// Server-assigned, emitted exactly once (at creation) and never
    /// retrievable again.
    ComputedSensitiveOnce,
}

impl Mutability {
    /// Whether a changed value may be applied in place.
    #[must_use]
    pub fn updatable(&self) -> bool {
        matches!(
            self,
            Self::Required {
                forces_replacement: false
            } | Self::OptionalMutable
        )
    }

    /// Whether a changed value forces destroy-then-recreate.
    #[must_use]
    pub fn forces_replacement(&self) -> bool {
        matches!(
            self,
            Self::Required {
                forces_replacement: true
            } | Self::OptionalImmutable
        )
    }

    /// Whether the server owns this field.
    #[must_use]
    pub fn server_assigned(&self) -> bool {
        matches!(self, Self::Computed | Self::ComputedSensitiveOnce)
    }
}

/// Descriptor of one resource field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name as it appears in desired state.
    pub name: &'static str,
    /// Mutability class.
    pub mutability: Mutability,
}

/// Field table for the project resource.
pub const PROJECT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "id",
        mutability: Mutability::Computed,
    },
    FieldSpec {
        name: "name",
        mutability: Mutability::Required {
            forces_replacement: false,
        },
    },
    FieldSpec {
        name: "metadata",
        mutability: Mutability::OptionalMutable,
    },
    FieldSpec {
        name: "retention_days",
        mutability: Mutability::OptionalMutable,
    },
    FieldSpec {
        name: "created_at",
        mutability: Mutability::Computed,
    },
    FieldSpec {
        name: "updated_at",
        mutability: Mutability::Computed,
    },
];

/// Field table for the API key resource.
pub const API_KEY_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "id",
        mutability: Mutability::Computed,
    },
    FieldSpec {
        name: "project_id",
        mutability: Mutability::Required {
            forces_replacement: true,
        },
    },
    FieldSpec {
        name: "note",
        mutability: Mutability::OptionalImmutable,
    },
    FieldSpec {
        name: "public_key",
        mutability: Mutability::Computed,
    },
    FieldSpec {
        name: "secret_key",
        mutability: Mutability::ComputedSensitiveOnce,
    },
    FieldSpec {
        name: "display_secret_key",
        mutability: Mutability::Computed,
    },
    FieldSpec {
        name: "created_at",
        mutability: Mutability::Computed,
    },
];

/// Look up a field descriptor by name.
#[must_use]
pub fn field<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}

/// Verify that every changed field may be updated in place.
///
/// A change to a field that forces replacement (or to a server-assigned
/// field) during an update step is a precondition violation: the caller
/// was expected to plan a replacement instead, and the reconciler refuses
/// rather than silently applying a wrong change.
pub fn check_update(fields: &[FieldSpec], changed: &[&str]) -> Result<()> {
    for name in changed {
        let spec = field(fields, name).ok_or_else(|| {
            Error::validation(*name, "unknown field in desired state")
        })?;
        if !spec.mutability.updatable() {
            return Err(Error::validation(
                *name,
                "field is immutable; the change requires destroying and recreating the resource",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutability_classes() {
        assert!(
            Mutability::Required {
                forces_replacement: false
            }
            .updatable()
        );
        assert!(
            !Mutability::Required {
                forces_replacement: true
            }
            .updatable()
        );
        assert!(Mutability::OptionalMutable.updatable());
        assert!(Mutability::OptionalImmutable.forces_replacement());
        assert!(Mutability::Computed.server_assigned());
        assert!(Mutability::ComputedSensitiveOnce.server_assigned());
    }

    #[test]
    fn test_project_fields_allow_in_place_update() {
        assert!(check_update(PROJECT_FIELDS, &["name", "metadata", "retention_days"]).is_ok());
    }

    #[test]
    fn test_api_key_project_change_is_rejected() {
        let err = check_update(API_KEY_FIELDS, &["project_id"]).unwrap_err();
        let display = format!("{}", err);
        assert!(display.contains("project_id"));
        assert!(display.contains("immutable"));
    }

    #[test]
    fn test_api_key_note_change_is_rejected() {
        assert!(check_update(API_KEY_FIELDS, &["note"]).is_err());
    }

    #[test]
    fn test_unknown_field_is_never_dropped() {
        let err = check_update(PROJECT_FIELDS, &["colour"]).unwrap_err();
        assert!(format!("{}", err).contains("unknown field"));
    }

    #[test]
    fn test_secret_is_sensitive_once() {
        let spec = field(API_KEY_FIELDS, "secret_key").unwrap();
        assert_eq!(spec.mutability, Mutability::ComputedSensitiveOnce);
    }
}
