//! CI-side data: PR metadata and check-run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_QUEUED: &str = "queued";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

pub const CONCLUSION_SUCCESS: &str = "success";
pub const CONCLUSION_FAILURE: &str = "failure";
pub const CONCLUSION_CANCELLED: &str = "cancelled";
pub const CONCLUSION_TIMED_OUT: &str = "timed_out";

/// PR metadata, last commit and the edition's build check-run.
/// Fetched fresh per status call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub head_sha: String,
    pub updated_at: Option<DateTime<Utc>>,

    pub commit_author: String,
    pub commit_date: Option<DateTime<Utc>>,
    /// First line only.
    pub commit_message: String,

    pub check_name: String,
    /// `queued`, `in_progress`, `completed` or empty when no check-run exists yet.
    pub status: String,
    /// `success`, `failure`, `cancelled`, `timed_out` or empty.
    pub conclusion: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BuildInfo {
    pub fn apply_check_run(&mut self, run: &CheckRunPollState) {
        self.status = run.status.clone();
        self.conclusion = run.conclusion.clone();
        self.completed_at = run.completed_at;
    }
}

/// Parameters of one conditional check-run poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunQuery {
    pub sha: String,
    pub check_name: String,
    /// Caching token from the previous poll; `None` on the first request.
    pub etag: Option<String>,
}

/// Outcome of a single check-run poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunPollState {
    pub status: String,
    pub conclusion: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    /// Server answered 304; the other fields are carried over.
    pub not_modified: bool,
}

impl CheckRunPollState {
    /// Fold a fresh poll result onto the previous state.
    ///
    /// A not-modified answer keeps every field of `prior` and only refreshes
    /// the caching token when the server sent a new one.
    pub fn following(self, prior: &CheckRunPollState) -> CheckRunPollState {
        if !self.not_modified {
            return CheckRunPollState {
                etag: self.etag.or_else(|| prior.etag.clone()),
                ..self
            };
        }
        CheckRunPollState {
            etag: self.etag.or_else(|| prior.etag.clone()),
            not_modified: true,
            ..prior.clone()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == STATUS_QUEUED || self.status == STATUS_IN_PROGRESS
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(etag: &str) -> CheckRunPollState {
        CheckRunPollState {
            status: STATUS_IN_PROGRESS.to_string(),
            etag: Some(etag.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_not_modified_carries_prior_fields() {
        let prior = CheckRunPollState {
            status: STATUS_COMPLETED.to_string(),
            conclusion: CONCLUSION_SUCCESS.to_string(),
            completed_at: Some(Utc::now()),
            etag: Some("\"a\"".to_string()),
            not_modified: false,
        };
        let next = CheckRunPollState {
            not_modified: true,
            etag: Some("\"a\"".to_string()),
            ..Default::default()
        }
        .following(&prior);

        assert!(next.not_modified);
        assert_eq!(next.status, prior.status);
        assert_eq!(next.conclusion, prior.conclusion);
        assert_eq!(next.completed_at, prior.completed_at);
        assert_eq!(next.etag, prior.etag);
    }

    #[test]
    fn test_not_modified_without_etag_keeps_token() {
        let prior = running("\"v1\"");
        let next = CheckRunPollState {
            not_modified: true,
            ..Default::default()
        }
        .following(&prior);
        assert_eq!(next.etag.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn test_fresh_result_replaces_fields() {
        let prior = running("\"v1\"");
        let fresh = CheckRunPollState {
            status: STATUS_COMPLETED.to_string(),
            conclusion: CONCLUSION_FAILURE.to_string(),
            etag: Some("\"v2\"".to_string()),
            ..Default::default()
        };
        let next = fresh.clone().following(&prior);
        assert_eq!(next, fresh);
        assert!(next.is_completed());
        assert!(!next.is_running());
    }

    #[test]
    fn test_apply_check_run_copies_ci_fields() {
        let mut info = BuildInfo {
            number: 5,
            ..Default::default()
        };
        info.apply_check_run(&running("x"));
        assert_eq!(info.status, STATUS_IN_PROGRESS);
        assert_eq!(info.number, 5);
    }
}
