//! Collaborator traits for the three sources of truth.
//!
//! - `ClusterSource`: the deployment's pod and its restart hook
//! - `CiSource`: pull-request metadata and build check-runs
//! - `RegistrySource`: tag and digest resolution in the image registry
//!
//! Production implementations live in the `dhstatus-kube`, `dhstatus-github`
//! and `dhstatus-registry` crates. In-memory fakes are in [`crate::fakes`].

use async_trait::async_trait;

use crate::domain::{
    BuildInfo, CheckRunPollState, CheckRunQuery, ClusterSnapshot, ImageRef, RegistryCredentials,
    RegistryVerdict, SourceResult,
};

/// Live cluster state for the watched deployment.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// Pick the deployment's pod (a `Running` one if any) and capture it.
    /// Fails when no pod matches the label selector.
    async fn fetch_snapshot(&self) -> SourceResult<ClusterSnapshot>;

    /// Trigger a rolling restart of the deployment.
    async fn restart_deployment(&self) -> SourceResult<()>;
}

/// CI system holding the pull request and its check-runs.
#[async_trait]
pub trait CiSource: Send + Sync {
    /// PR metadata, then last-commit details and the named check-run in parallel.
    /// `skip_commit_details` drops the commit lookup to save API quota.
    async fn fetch_pr_info(
        &self,
        number: u64,
        check_name: &str,
        skip_commit_details: bool,
    ) -> SourceResult<BuildInfo>;

    /// Head commit SHA of the pull request.
    async fn fetch_head_sha(&self, number: u64) -> SourceResult<String>;

    /// Most recent check-run named `query.check_name` on `query.sha`.
    /// With `query.etag` set, a 304 answer yields `not_modified = true`.
    async fn poll_check_run(&self, query: &CheckRunQuery) -> SourceResult<CheckRunPollState>;
}

/// Image registry speaking the Docker Registry v2 API.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Resolve `image.tag` and compare it with `running_digest`. Never fails;
    /// problems are reported in [`RegistryVerdict::error`].
    async fn check(
        &self,
        image: &ImageRef,
        running_digest: Option<&str>,
        credentials: Option<&RegistryCredentials>,
    ) -> RegistryVerdict;
}
