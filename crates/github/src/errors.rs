//! GitHub adapter errors and their translation into [`autocut::TrackerError`].

use std::time::Duration;

use autocut::{RetryPolicy, TrackerError};
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The client could not be built (bad base URL, unusable token).
    #[error("invalid GitHub client configuration: {0}")]
    Configuration(String),

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("{operation}: request failed: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// GitHub answered with a non-success status.
    #[error("{operation}: GitHub responded {status}: {message}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        message: String,
        /// Parsed `Retry-After` header, if any.
        retry_after: Option<Duration>,
        /// `403` with an exhausted primary rate limit.
        rate_limited: bool,
    },

    /// The response body did not have the expected shape.
    #[error("{operation}: could not decode response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl GithubError {
    /// Returns true if the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            GithubError::Network { .. } => true,
            GithubError::Status {
                status,
                rate_limited,
                ..
            } => {
                *rate_limited
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            GithubError::Configuration(_) | GithubError::Decode { .. } => false,
        }
    }
}

impl From<GithubError> for TrackerError {
    fn from(err: GithubError) -> Self {
        let transient = err.is_transient();
        match err {
            GithubError::Status {
                operation,
                status,
                message,
                retry_after,
                ..
            } => TrackerError::Rejected {
                operation: operation.to_string(),
                status: status.as_u16(),
                message,
                retry: if transient {
                    RetryPolicy::Retryable { after: retry_after }
                } else {
                    RetryPolicy::NonRetryable
                },
            },
            GithubError::Network { operation, source } => TrackerError::Transport {
                operation: operation.to_string(),
                message: source.to_string(),
                retry: RetryPolicy::Retryable { after: None },
            },
            GithubError::Decode { operation, source } => TrackerError::Transport {
                operation: operation.to_string(),
                message: format!("could not decode response: {source}"),
                retry: RetryPolicy::NonRetryable,
            },
            GithubError::Configuration(message) => TrackerError::Transport {
                operation: "configure client".to_string(),
                message,
                retry: RetryPolicy::NonRetryable,
            },
        }
    }
}
