//! One-shot status collection: snapshot the cluster, then query CI and the
//! registry concurrently under one shared deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::deadline::bounded;
use crate::domain::{
    BuildInfo, ClusterSnapshot, PullRequestTag, RegistryVerdict, SourceError, SourceResult,
};
use crate::freshness::{self, Freshness};
use crate::obs;
use crate::sources::{CiSource, ClusterSource, RegistrySource};

pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct StatusOptions {
    /// Do not contact the CI system.
    pub skip_ci: bool,
    /// Do not contact the image registry.
    pub skip_registry: bool,
    /// Skip the last-commit lookup (short output does not show it).
    pub skip_commit_details: bool,
    /// Overall deadline for the whole collection.
    pub timeout: Duration,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            skip_ci: false,
            skip_registry: false,
            skip_commit_details: false,
            timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

/// Everything the status view renders.
///
/// `build` is `None` when CI was not queried (skipped, or not a PR tag) and
/// `Some(Err)` when the query failed; `registry` is `None` when skipped.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub snapshot: ClusterSnapshot,
    pub pull_request: PullRequestTag,
    pub build: Option<SourceResult<BuildInfo>>,
    pub registry: Option<RegistryVerdict>,
    pub freshness: Freshness,
}

impl StatusReport {
    pub fn build_info(&self) -> Option<&BuildInfo> {
        self.build.as_ref().and_then(|b| b.as_ref().ok())
    }

    pub fn build_error(&self) -> Option<&SourceError> {
        self.build.as_ref().and_then(|b| b.as_ref().err())
    }
}

/// Collect a [`StatusReport`].
///
/// Only a failed cluster lookup is an error. CI and registry failures are
/// carried in the report so the remaining sources still render.
pub async fn collect_status(
    cluster: &dyn ClusterSource,
    ci: &dyn CiSource,
    registry: &dyn RegistrySource,
    options: &StatusOptions,
    cancel: &CancellationToken,
) -> SourceResult<StatusReport> {
    let deadline = Instant::now() + options.timeout;
    let snapshot = bounded(cluster.fetch_snapshot(), deadline, cancel).await??;
    let pull_request = snapshot.pull_request();

    let ci_fetch = async {
        if options.skip_ci || !pull_request.is_preview() {
            return None;
        }
        let check_name = pull_request.check_name();
        let fetched = ci.fetch_pr_info(
            pull_request.number,
            &check_name,
            options.skip_commit_details,
        );
        Some(match bounded(fetched, deadline, cancel).await {
            Ok(result) => result,
            Err(halt) => Err(halt.into()),
        })
    };

    let registry_fetch = async {
        if options.skip_registry {
            return None;
        }
        let checked = registry.check(
            &snapshot.image_ref,
            snapshot.running_digest.as_deref(),
            snapshot.registry_credentials.as_ref(),
        );
        let verdict = match bounded(checked, deadline, cancel).await {
            Ok(verdict) => verdict,
            Err(halt) => RegistryVerdict::failed(halt.into()),
        };
        obs::emit_registry_checked(&snapshot.image, &verdict);
        Some(verdict)
    };

    let (build, verdict) = async { tokio::join!(ci_fetch, registry_fetch) }
        .instrument(obs::tag_span(snapshot.tag()))
        .await;

    let freshness = freshness::evaluate(
        &snapshot,
        build.as_ref().and_then(|b| b.as_ref().ok()),
        verdict.as_ref(),
    );
    obs::emit_status_evaluated(&snapshot.pod_name, pull_request.number, &freshness);

    Ok(StatusReport {
        snapshot,
        pull_request,
        build,
        registry: verdict,
        freshness,
    })
}
