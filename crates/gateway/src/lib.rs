//! # Gateway
//!
//! Blocking client for the Lumetry management API.
//!
//! This crate is the transport layer: it turns typed requests into
//! authenticated HTTP calls against the fixed endpoint table of the
//! management API and folds responses back into typed results. Policy
//! (what to create, update, or delete) lives in the `reconcile` crate;
//! this crate only moves bytes.
//!
//! ## Guarantees
//!
//! - One method call is one HTTP exchange with a 30-second deadline.
//!   No retries, no caching, no background work.
//! - Authentication is HTTP Basic with a (public key, secret key) pair
//!   fixed at construction.
//! - Failures are classified: configuration problems, transport errors
//!   (with the original status), missing resources (404), and undecodable
//!   or off-contract responses are distinct [`Error`] variants.
//!
//! ## Example
//!
//! ```no_run
//! use gateway::{Credentials, HttpRemote, Remote};
//!
//! let credentials = Credentials::resolve(
//!     Some("https://api.example.com".to_string()),
//!     None, // falls back to LUMETRY_PUBLIC_KEY
//!     None, // falls back to LUMETRY_SECRET_KEY
//! )?;
//! let remote = HttpRemote::new(&credentials);
//! for project in remote.list_projects()? {
//!     println!("{} ({})", project.name, project.id);
//! }
//! # Ok::<(), gateway::Error>(())
//! ```

pub mod credentials;
pub mod error;
pub mod remote;
pub mod types;

// Re-export main types at crate root
pub use credentials::{Credentials, ENV_API_HOST, ENV_PUBLIC_KEY, ENV_SECRET_KEY};
pub use error::{Error, ErrorCategory, Result};
pub use remote::http::HttpRemote;
pub use remote::{MockRemote, Remote};
pub use types::{
    ApiKey, ApiKeyDeletion, ApiKeyList, CreateApiKey, CreateProject, Project, ProjectList,
    UpdateProject,
};
