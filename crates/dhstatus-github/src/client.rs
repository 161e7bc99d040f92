//! GitHub client: PR metadata, last commit and build check-runs.

use async_trait::async_trait;
use dhstatus_core::{
    BuildInfo, CheckRunPollState, CheckRunQuery, CiSource, SourceError, SourceResult,
};
use tracing::debug;

use crate::config::GitHubConfig;
use crate::http::{get_conditional, get_json, Conditional};
use crate::types::{first_line, parse_time, CheckRunsResponse, CommitResponse, PullRequestResponse};

/// GitHub REST client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(GitHubClient { config, http })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    async fn pull_request(&self, number: u64) -> SourceResult<PullRequestResponse> {
        let url = self.config.repo_url(&format!("pulls/{number}"));
        get_json(&self.http, &self.config, &url, &[])
            .await
            .map_err(|e| e.context(format!("fetch PR #{number}")))
    }

    async fn commit(&self, sha: &str) -> SourceResult<CommitResponse> {
        let url = self.config.repo_url(&format!("commits/{sha}"));
        get_json(&self.http, &self.config, &url, &[])
            .await
            .map_err(|e| e.context(format!("fetch commit {sha}")))
    }

    async fn check_runs(
        &self,
        sha: &str,
        check_name: &str,
        etag: Option<&str>,
    ) -> SourceResult<Conditional<CheckRunsResponse>> {
        let url = self.config.repo_url(&format!("commits/{sha}/check-runs"));
        let query = [("check_name", check_name), ("per_page", "1")];
        get_conditional(&self.http, &self.config, &url, &query, etag).await
    }

    async fn latest_check_run(&self, sha: &str, check_name: &str) -> SourceResult<CheckRunPollState> {
        let answer = match self.check_runs(sha, check_name, None).await {
            Ok(Conditional::Fresh { body, etag }) => Ok(body.latest(etag)),
            Ok(Conditional::NotModified { .. }) => Err(SourceError::Protocol(
                "HTTP 304 without a cached copy".to_string(),
            )),
            Err(err) => Err(err),
        };
        answer.map_err(|e| e.context(format!("fetch check-run {check_name:?} for {sha}")))
    }
}

#[async_trait]
impl CiSource for GitHubClient {
    async fn fetch_pr_info(
        &self,
        number: u64,
        check_name: &str,
        skip_commit_details: bool,
    ) -> SourceResult<BuildInfo> {
        let pr = self.pull_request(number).await?;
        let sha = pr.head.sha;

        let commit = async {
            if skip_commit_details {
                return Ok(None);
            }
            self.commit(&sha).await.map(Some)
        };
        let (commit, check_run) =
            tokio::try_join!(commit, self.latest_check_run(&sha, check_name))?;
        debug!(pr = number, sha = %sha, status = %check_run.status, "fetched PR info");

        let mut info = BuildInfo {
            number,
            title: pr.title,
            url: pr.html_url,
            updated_at: parse_time(pr.updated_at.as_deref()),
            check_name: check_name.to_string(),
            ..Default::default()
        };
        if let Some(commit) = commit {
            if let Some(author) = commit.commit.author {
                info.commit_author = author.name;
                info.commit_date = parse_time(author.date.as_deref());
            }
            info.commit_message = first_line(&commit.commit.message).to_string();
        }
        info.apply_check_run(&check_run);
        info.head_sha = sha;
        Ok(info)
    }

    async fn fetch_head_sha(&self, number: u64) -> SourceResult<String> {
        let pr = self.pull_request(number).await?;
        if pr.head.sha.is_empty() {
            return Err(SourceError::Decode(format!(
                "pull request #{number} has no head commit"
            )));
        }
        Ok(pr.head.sha)
    }

    async fn poll_check_run(&self, query: &CheckRunQuery) -> SourceResult<CheckRunPollState> {
        let answer = self
            .check_runs(&query.sha, &query.check_name, query.etag.as_deref())
            .await?;
        Ok(match answer {
            Conditional::NotModified { etag } => CheckRunPollState {
                etag,
                not_modified: true,
                ..Default::default()
            },
            Conditional::Fresh { body, etag } => body.latest(etag),
        })
    }
}
