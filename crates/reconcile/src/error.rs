//! Error types for reconciliation.
//!
//! Every failure is returned to the caller as a typed result; the
//! reconcilers perform no internal retries and no silent recovery. A
//! partial failure during a multi-call operation leaves the instance in a
//! state the caller can inspect. In particular, a create followed by a
//! decode failure means the remote resource may exist even though the
//! call failed (at-least-once creation).

use thiserror::Error;

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a reconciliation step.
#[derive(Debug, Error)]
pub enum Error {
    /// Desired state violates a schema rule. Fatal for the step; no
    /// partial mutation was performed.
    #[error("invalid desired state for `{field}`: {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// Description of the violation.
        message: String,
    },

    /// The target of a read or delete no longer exists remotely.
    ///
    /// For reads this is an expected outcome: the caller should treat
    /// the resource as needing recreation, not as a crash.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested operation does not exist for this resource type.
    #[error("{operation} is not supported: {message}")]
    Unsupported {
        /// Operation that was attempted.
        operation: &'static str,
        /// Why, and what to do instead.
        message: String,
    },

    /// The remote reported success at the transport level but the
    /// response contradicts the operation's contract.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Transport-level failure, propagated with the original status and
    /// message. Never retried here.
    #[error(transparent)]
    Transport(gateway::Error),
}

impl Error {
    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the target resource is gone remotely.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether this error is typically transient and worth retrying by
    /// the caller. Reconcilers themselves never retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<gateway::Error> for Error {
    fn from(err: gateway::Error) -> Self {
        // A remote 404 is a missing resource, not a transport failure.
        match err {
            gateway::Error::NotFound(what) => Self::NotFound(what),
            other => Self::Transport(other),
        }
    }
}
