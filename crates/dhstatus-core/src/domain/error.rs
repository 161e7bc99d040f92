//! Error taxonomy shared by every collaborator.

use std::time::Duration;

/// Errors produced while talking to the cluster, the CI API or the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Network or DNS failure before a response was received.
    #[error("request failed: {0}")]
    Transport(String),

    /// Unexpected HTTP status or a missing/garbled response header.
    #[error("{0}")]
    Protocol(String),

    /// Registry token exchange failed.
    #[error("registry auth: {0}")]
    Auth(String),

    /// CI API answered HTTP 403.
    #[error("rate limited ({})", describe_reset(.reset_in))]
    RateLimited { reset_in: Option<Duration> },

    /// The requested reference does not exist (registry HTTP 404).
    #[error("{reference} not found")]
    NotFound { reference: String },

    /// Response body could not be decoded.
    #[error("cannot decode response: {0}")]
    Decode(String),

    /// Caller supplied something unusable (incomplete image reference, ...).
    #[error("{0}")]
    InvalidInput(String),

    /// Kubernetes API failure.
    #[error("{0}")]
    Cluster(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("cancelled")]
    Cancelled,
}

impl SourceError {
    /// Whether this is the distinguished "absent" condition rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }

    /// Prefix the message with the call that failed, e.g. `fetch PR #7: HTTP 502`.
    ///
    /// Variants other code branches on (rate limit, not found, deadline) are
    /// returned unchanged.
    pub fn context(self, call: impl std::fmt::Display) -> Self {
        match self {
            SourceError::Transport(msg) => SourceError::Transport(format!("{call}: {msg}")),
            SourceError::Protocol(msg) => SourceError::Protocol(format!("{call}: {msg}")),
            SourceError::Decode(msg) => SourceError::Decode(format!("{call}: {msg}")),
            SourceError::InvalidInput(msg) => SourceError::InvalidInput(format!("{call}: {msg}")),
            SourceError::Cluster(msg) => SourceError::Cluster(format!("{call}: {msg}")),
            other => other,
        }
    }
}

fn describe_reset(reset_in: &Option<Duration>) -> String {
    match reset_in {
        Some(wait) if !wait.is_zero() => {
            let whole = Duration::from_secs(wait.as_secs());
            format!("resets in {}", humantime::format_duration(whole))
        }
        _ => "HTTP 403".to_string(),
    }
}

/// Failures that stop the watch loop before polling starts.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("image tag {tag:?} is not a PR tag")]
    NotPreviewTag { tag: String },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Result type for collaborator calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_with_reset_mentions_wait() {
        let err = SourceError::RateLimited {
            reset_in: Some(Duration::from_millis(125_700)),
        };
        assert_eq!(err.to_string(), "rate limited (resets in 2m 5s)");
    }

    #[test]
    fn test_rate_limit_without_reset_mentions_status() {
        let err = SourceError::RateLimited { reset_in: None };
        assert_eq!(err.to_string(), "rate limited (HTTP 403)");

        let err = SourceError::RateLimited {
            reset_in: Some(Duration::ZERO),
        };
        assert_eq!(err.to_string(), "rate limited (HTTP 403)");
    }

    #[test]
    fn test_not_found_is_distinguished() {
        let err = SourceError::NotFound {
            reference: "pr1".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!SourceError::Protocol("HTTP 500".to_string()).is_not_found());
    }

    #[test]
    fn test_context_prefixes_messages() {
        let err = SourceError::Protocol("HTTP 502".to_string()).context("fetch PR #7");
        assert_eq!(err.to_string(), "fetch PR #7: HTTP 502");

        let err = SourceError::Decode("EOF".to_string()).context("fetch commit abc");
        assert_eq!(err, SourceError::Decode("fetch commit abc: EOF".to_string()));
    }

    #[test]
    fn test_context_keeps_structured_variants() {
        let limited = SourceError::RateLimited {
            reset_in: Some(Duration::from_secs(60)),
        };
        assert_eq!(limited.clone().context("fetch PR #7"), limited);

        let missing = SourceError::NotFound {
            reference: "pr7".to_string(),
        };
        assert!(missing.context("fetch PR #7").is_not_found());
        assert_eq!(
            SourceError::DeadlineExceeded.context("fetch PR #7"),
            SourceError::DeadlineExceeded
        );
    }

    #[test]
    fn test_watch_error_wraps_source() {
        let err: WatchError = SourceError::Cluster("no pods".to_string()).into();
        assert_eq!(err.to_string(), "no pods");

        let err = WatchError::NotPreviewTag {
            tag: "main".to_string(),
        };
        assert!(err.to_string().contains("\"main\""));
    }
}
