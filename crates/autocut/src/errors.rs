//! Error and retry-policy types for the autocut domain.
//!
//! [`TrackerError`] is what the ports in [`crate::tracker`] return; infrastructure
//! adapters translate their own failures into it. [`CutError`] is what
//! [`crate::Cutter::cut`] returns: every tracker failure is wrapped with the
//! operation and target it concerned, and nothing is ever swallowed.
//!
//! [`RetryPolicy`] lets the caller decide whether re-running the whole cut is
//! worthwhile. The dispatcher itself never retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::ParseDurationError;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: transport failures, timeouts, rate limiting and
///   tracker-side 5xx responses.
/// - `NonRetryable` errors: rejected requests (bad credentials, validation
///   failures), missing projects or columns, invalid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, usually taken from a
        /// `Retry-After` response header. `None` means the caller's own
        /// back-off schedule applies.
        after: Option<Duration>,
    },
    /// Re-running will fail the same way until something changes.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// A call to the issue tracker failed.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The tracker could not be reached, timed out, or returned something
    /// undecodable.
    #[error("{operation}: transport failure: {message}")]
    Transport {
        /// Short name of the tracker operation (e.g. `"list issues"`).
        operation: String,
        /// Underlying failure description.
        message: String,
        /// Whether the failure looks transient.
        retry: RetryPolicy,
    },

    /// The tracker answered but refused the request.
    #[error("{operation}: rejected with status {status}: {message}")]
    Rejected {
        /// Short name of the tracker operation.
        operation: String,
        /// Status code reported by the tracker.
        status: u16,
        /// Response body or reason, truncated.
        message: String,
        /// Whether the rejection looks transient (rate limit, 5xx).
        retry: RetryPolicy,
    },
}

impl TrackerError {
    /// Returns the retry hint carried by this error.
    pub fn retry_policy(&self) -> &RetryPolicy {
        match self {
            TrackerError::Transport { retry, .. } | TrackerError::Rejected { retry, .. } => retry,
        }
    }
}

// ---------------------------------------------------------------------------
// Cut-level errors
// ---------------------------------------------------------------------------

/// Kind of named tracker resource that can be looked up and not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Column,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Project => f.write_str("project"),
            ResourceKind::Column => f.write_str("column"),
        }
    }
}

fn in_scope(scope: &Option<String>) -> String {
    scope.as_ref().map(|s| format!(" in {s}")).unwrap_or_default()
}

/// Errors returned by [`crate::Cutter::cut`].
///
/// No variant ever carries a partial disposition: if a cut fails, the caller
/// learns only what failed, not what was already done.
#[derive(Debug, Error)]
pub enum CutError {
    /// A required field was empty or malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// A tracker call failed; the remainder of the cut was abandoned.
    #[error("failed to {operation} ({target})")]
    Transport {
        /// What the dispatcher was doing (e.g. `"reopen issue"`).
        operation: &'static str,
        /// Identifiers of the thing being operated on (e.g. `"#42"`).
        target: String,
        /// The port-level failure.
        #[source]
        source: TrackerError,
    },

    /// A named project or column does not exist.
    #[error("{kind} {name:?} not found{}", in_scope(.scope))]
    NotFound {
        /// Project or column.
        kind: ResourceKind,
        /// The name that was looked up.
        name: String,
        /// Where the lookup happened (e.g. the project for a column lookup).
        scope: Option<String>,
    },

    /// The caller abandoned the cut (timeout or interrupt) before it finished.
    #[error("cut cancelled: {reason}")]
    Cancelled {
        /// Why the cut was abandoned.
        reason: String,
    },
}

impl CutError {
    pub(crate) fn transport(
        operation: &'static str,
        target: impl Into<String>,
        source: TrackerError,
    ) -> Self {
        CutError::Transport {
            operation,
            target: target.into(),
            source,
        }
    }

    /// Returns whether re-running the whole cut might succeed.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            CutError::Transport { source, .. } => source.retry_policy().clone(),
            CutError::Cancelled { .. } => RetryPolicy::Retryable { after: None },
            CutError::InvalidInput { .. } | CutError::NotFound { .. } => RetryPolicy::NonRetryable,
        }
    }
}

impl From<ParseDurationError> for CutError {
    fn from(err: ParseDurationError) -> Self {
        CutError::InvalidInput {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_limited() -> TrackerError {
        TrackerError::Rejected {
            operation: "create comment".to_string(),
            status: 429,
            message: "slow down".to_string(),
            retry: RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30)),
            },
        }
    }

    #[test]
    fn transport_error_names_operation_and_target() {
        let err = CutError::transport("comment on issue", "#42", rate_limited());
        assert_eq!(err.to_string(), "failed to comment on issue (#42)");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("create comment: rejected with status 429: slow down")
        );
    }

    #[test]
    fn retry_policy_is_inherited_from_the_tracker() {
        let err = CutError::transport("comment on issue", "#42", rate_limited());
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30))
            }
        );
    }

    #[test]
    fn not_found_mentions_scope_when_present() {
        let project = CutError::NotFound {
            kind: ResourceKind::Project,
            name: "Triage".to_string(),
            scope: None,
        };
        assert_eq!(project.to_string(), "project \"Triage\" not found");
        assert_eq!(project.retry_policy(), RetryPolicy::NonRetryable);

        let column = CutError::NotFound {
            kind: ResourceKind::Column,
            name: "Inbox".to_string(),
            scope: Some("project \"Triage\"".to_string()),
        };
        assert_eq!(
            column.to_string(),
            "column \"Inbox\" not found in project \"Triage\""
        );
    }

    #[test]
    fn duration_errors_become_invalid_input() {
        let err: CutError = "-1h".parse::<crate::AgeThreshold>().unwrap_err().into();
        assert!(matches!(err, CutError::InvalidInput { .. }));
        assert!(err.to_string().contains("negative durations are not allowed"));
    }
}
