//! Client credential resolution.
//!
//! The management API authenticates every call with HTTP Basic auth using
//! a (public key, secret key) pair against a configured host. Values can
//! be supplied explicitly or through environment variables; explicit
//! values win. Missing values are a hard configuration error reported
//! before any network call.

use crate::error::{Error, Result};

/// Environment fallback for the API host.
pub const ENV_API_HOST: &str = "LUMETRY_API_HOST";
/// Environment fallback for the public key.
pub const ENV_PUBLIC_KEY: &str = "LUMETRY_PUBLIC_KEY";
/// Environment fallback for the secret key.
pub const ENV_SECRET_KEY: &str = "LUMETRY_SECRET_KEY";

/// A fully resolved set of client credentials.
///
/// Credentials are an explicitly passed value injected into the client at
/// construction; nothing here is process-global. The `Debug` output
/// redacts the secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL of the API host, without a trailing slash.
    pub api_host: String,
    /// Public half of the credential pair (Basic auth username).
    pub public_key: String,
    /// Secret half of the credential pair (Basic auth password).
    pub secret_key: String,
}

impl Credentials {
    /// Create credentials from explicit values.
    #[must_use]
    pub fn new(
        api_host: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            api_host: normalize_host(api_host.into()),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Resolve credentials from explicit values with environment fallback.
    ///
    /// Each value falls back to its `LUMETRY_*` environment variable when
    /// not supplied. If any value is still missing, returns a single
    /// [`Error::Config`] enumerating every missing value and how to
    /// supply it.
    pub fn resolve(
        api_host: Option<String>,
        public_key: Option<String>,
        secret_key: Option<String>,
    ) -> Result<Self> {
        Self::resolve_with(api_host, public_key, secret_key, |name| {
            std::env::var(name).ok()
        })
    }

    /// Resolve credentials using a custom environment lookup.
    pub fn resolve_with(
        api_host: Option<String>,
        public_key: Option<String>,
        secret_key: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_host = pick(api_host, env(ENV_API_HOST));
        let public_key = pick(public_key, env(ENV_PUBLIC_KEY));
        let secret_key = pick(secret_key, env(ENV_SECRET_KEY));

        let mut missing = Vec::new();
        if api_host.is_none() {
            missing.push(missing_line("api_host", ENV_API_HOST));
        }
        if public_key.is_none() {
            missing.push(missing_line("public_key", ENV_PUBLIC_KEY));
        }
        if secret_key.is_none() {
            missing.push(missing_line("secret_key", ENV_SECRET_KEY));
        }

        if !missing.is_empty() {
            return Err(Error::Config(missing.join("\n")));
        }

        Ok(Self::new(
            api_host.unwrap_or_default(),
            public_key.unwrap_or_default(),
            secret_key.unwrap_or_default(),
        ))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_host", &self.api_host)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Explicit value wins over the environment; empty strings count as unset.
fn pick(explicit: Option<String>, env: Option<String>) -> Option<String> {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| env.filter(|v| !v.is_empty()))
}

fn missing_line(option: &str, env_var: &str) -> String {
    format!(
        "  {option} is missing: set the {option} option in the configuration \
         or the {env_var} environment variable"
    )
}

fn normalize_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}
