//! Error types for management API calls.
//!
//! Errors are categorized so callers can distinguish configuration
//! problems (fatal before any network call), transient transport
//! failures, and missing remote resources.

use std::fmt;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of gateway errors.
///
/// Error categories help the caller decide whether an operation is worth
/// retrying and what kind of user feedback is appropriate. The gateway
/// itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid client configuration.
    Config,
    /// Network-related errors (transient, retryable by the caller).
    Network,
    /// The addressed resource does not exist remotely.
    NotFound,
    /// The remote answered with a body or status the client cannot accept.
    Protocol,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Config => "Client configuration problem",
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Resource not found",
            Self::Protocol => "Unexpected API response",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Config => "Check the credentials configuration and environment variables",
            Self::Network => "Check your internet connection and try again",
            Self::NotFound => "The resource may have been deleted outside of this tool",
            Self::Protocol => "The API host may be running an incompatible version",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the management API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required client configuration is missing.
    ///
    /// The message enumerates every missing value and how to supply it.
    #[error("incomplete client configuration:\n{0}")]
    Config(String),

    /// HTTP request failed (connect, timeout, TLS, or an error status).
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if the request reached the server.
        status: Option<u16>,
    },

    /// The addressed resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request succeeded but with a status the endpoint does not define.
    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus {
        /// Status code the endpoint contract defines.
        expected: u16,
        /// Status code the server actually returned.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::Http { .. } => ErrorCategory::Network,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::UnexpectedStatus { .. } | Error::InvalidResponse(_) => ErrorCategory::Protocol,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether this error means the addressed resource is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(404) => Self::NotFound("HTTP 404".to_string()),
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
