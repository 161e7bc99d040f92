//! GitHub API response types.

use chrono::{DateTime, Utc};
use dhstatus_core::CheckRunPollState;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PullRequestResponse {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub head: HeadRef,
}

#[derive(Debug, Default, Deserialize)]
pub struct HeadRef {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitResponse {
    #[serde(default)]
    pub commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<CommitAuthor>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckRunsResponse {
    #[serde(default)]
    pub check_runs: Vec<CheckRunEntry>,
}

/// `conclusion` and `completed_at` are `null` until the run completes.
#[derive(Debug, Default, Deserialize)]
pub struct CheckRunEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl CheckRunsResponse {
    /// State of the most recent run; all fields empty when there is none.
    pub fn latest(self, etag: Option<String>) -> CheckRunPollState {
        let Some(run) = self.check_runs.into_iter().next() else {
            return CheckRunPollState {
                etag,
                ..Default::default()
            };
        };
        CheckRunPollState {
            status: run.status,
            conclusion: run.conclusion.unwrap_or_default(),
            completed_at: parse_time(run.completed_at.as_deref()),
            etag,
            not_modified: false,
        }
    }
}

/// RFC 3339 timestamp; anything unparseable counts as absent.
pub fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub fn first_line(message: &str) -> &str {
    message.split('\n').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_check_run_with_null_conclusion() {
        let body: CheckRunsResponse = serde_json::from_str(
            r#"{"total_count":1,"check_runs":[{"status":"in_progress","conclusion":null,"completed_at":null}]}"#,
        )
        .unwrap();
        let state = body.latest(Some("W/\"x\"".to_string()));
        assert_eq!(state.status, "in_progress");
        assert_eq!(state.conclusion, "");
        assert_eq!(state.completed_at, None);
        assert_eq!(state.etag.as_deref(), Some("W/\"x\""));
    }

    #[test]
    fn test_no_check_runs_is_empty_state() {
        let body: CheckRunsResponse =
            serde_json::from_str(r#"{"total_count":0,"check_runs":[]}"#).unwrap();
        let state = body.latest(None);
        assert!(state.status.is_empty());
        assert!(!state.not_modified);
    }

    #[test]
    fn test_parse_time_is_lenient() {
        assert_eq!(
            parse_time(Some("2025-03-01T10:15:00Z")),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(parse_time(Some("yesterday")), None);
        assert_eq!(parse_time(None), None);
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("Fix hooks\n\nLong body"), "Fix hooks");
        assert_eq!(first_line("single"), "single");
        assert_eq!(first_line(""), "");
    }
}
