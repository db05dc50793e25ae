//! # Reconcile
//!
//! Resource lifecycle reconciliation for Lumetry projects and API keys.
//!
//! This crate encodes the rules that make declarative management of the
//! remote platform safe: which fields may change in place and which force
//! a replacement, how one-time secrets are preserved, how drift and
//! errors are classified, and which operations simply do not exist for a
//! resource type.
//!
//! ## Core concepts
//!
//! - **Spec**: the caller-declared desired state of one resource instance
//!   ([`ProjectSpec`], [`ApiKeySpec`]).
//! - **Record**: the state last confirmed from the remote
//!   ([`ProjectRecord`], [`ApiKeyRecord`]). The host persists records
//!   between runs; reconcilers never cache them.
//! - **Schema**: per-field mutability classes ([`schema`]) consulted by
//!   reconcilers and planning alike.
//! - **Action**: the operation that converges one instance
//!   ([`plan::Action`]).
//!
//! ## Lifecycle
//!
//! Both resource types share the state machine
//! `Absent → create → Present → update* → Present → delete → Absent`,
//! with `read` refreshing a present record (or reporting it absent) and
//! `import` reconstructing a record from an id. API keys restrict it
//! further: `update` is a fatal error by design, and `import` is
//! unconditionally unsupported.
//!
//! ## Example
//!
//! ```
//! use gateway::MockRemote;
//! use reconcile::{ProjectReconciler, ProjectSpec};
//!
//! let remote = MockRemote::new();
//! let projects = ProjectReconciler::new(&remote);
//!
//! let record = projects.create(&ProjectSpec::named("demo"))?;
//! assert_eq!(projects.read(&record.id)?, record);
//! # Ok::<(), reconcile::Error>(())
//! ```

pub mod api_key;
pub mod error;
pub mod plan;
pub mod project;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use api_key::ApiKeyReconciler;
pub use error::{Error, Result};
pub use plan::{Action, plan_api_key, plan_project};
pub use project::ProjectReconciler;
pub use schema::{API_KEY_FIELDS, FieldSpec, Mutability, PROJECT_FIELDS};
pub use types::{ApiKeyRecord, ApiKeySpec, ProjectRecord, ProjectSpec};
