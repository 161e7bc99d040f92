//! Watch loop: poll the edition's build check-run until it finishes.
//!
//! ```text
//! Start ─ resolve target ─┬─ error ──────────────────────────── Errored      (exit 2)
//!                         └─ Polling ─┬─ completed/success ──── Succeeded    (exit 0)
//!                                     ├─ completed/other ────── Concluded    (exit 1)
//!                                     ├─ deadline ───────────── TimedOut     (exit 2)
//!                                     └─ interrupt ──────────── Interrupted  (exit 2)
//! ```
//!
//! One poll is in flight at a time. Poll errors are reported and retried on
//! the next tick; the caching token is threaded from each poll into the next.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::deadline::{bounded, Halt};
use crate::domain::build::{
    CONCLUSION_CANCELLED, CONCLUSION_FAILURE, CONCLUSION_SUCCESS, CONCLUSION_TIMED_OUT,
    STATUS_IN_PROGRESS, STATUS_QUEUED,
};
use crate::domain::{CheckRunPollState, CheckRunQuery, PullRequestTag, SourceError, WatchError};
use crate::obs;
use crate::sources::{CiSource, ClusterSource};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(3600);
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(15);
/// Bound on the cluster lookup while resolving the target.
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

/// Receives the live progress line and the final verdict.
///
/// `progress` replaces the current live line; `success`/`failure` end it.
/// `notice` prints a standalone line.
pub trait WatchObserver: Send + Sync {
    fn progress(&self, message: &str);
    fn notice(&self, message: &str);
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub interval: Duration,
    pub timeout: Duration,
    /// Restart the deployment once the build succeeds.
    pub restart_on_success: bool,
    pub restart_timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: DEFAULT_WATCH_TIMEOUT,
            restart_on_success: false,
            restart_timeout: RESTART_TIMEOUT,
        }
    }
}

/// What to watch: the PR behind the running tag and its head commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub pull_request: PullRequestTag,
    pub head_sha: String,
    pub check_name: String,
}

impl WatchTarget {
    /// First 12 characters of the head commit.
    pub fn short_sha(&self) -> &str {
        self.head_sha
            .char_indices()
            .nth(12)
            .map_or(self.head_sha.as_str(), |(end, _)| &self.head_sha[..end])
    }
}

/// Terminal state of a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Succeeded,
    /// Check-run completed with anything but `success`.
    Concluded { conclusion: String },
    TimedOut,
    Interrupted,
    /// Target could not be resolved.
    Errored { message: String },
}

impl WatchOutcome {
    /// `0` success, `1` build did not succeed, `2` local error/timeout/interrupt.
    pub fn exit_code(&self) -> u8 {
        match self {
            WatchOutcome::Succeeded => 0,
            WatchOutcome::Concluded { .. } => 1,
            WatchOutcome::TimedOut | WatchOutcome::Interrupted | WatchOutcome::Errored { .. } => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchOutcome::Succeeded => "succeeded",
            WatchOutcome::Concluded { .. } => "concluded",
            WatchOutcome::TimedOut => "timed_out",
            WatchOutcome::Interrupted => "interrupted",
            WatchOutcome::Errored { .. } => "errored",
        }
    }
}

/// Cluster snapshot → PR tag → head SHA. Any failure is fatal for the watch.
pub async fn resolve_watch_target(
    cluster: &dyn ClusterSource,
    ci: &dyn CiSource,
) -> Result<WatchTarget, WatchError> {
    let snapshot = tokio::time::timeout(SNAPSHOT_TIMEOUT, cluster.fetch_snapshot())
        .await
        .map_err(|_| SourceError::DeadlineExceeded)??;

    let pull_request = snapshot.pull_request();
    if !pull_request.is_preview() {
        return Err(WatchError::NotPreviewTag {
            tag: snapshot.tag().to_string(),
        });
    }

    let head_sha = ci.fetch_head_sha(pull_request.number).await?;
    let check_name = pull_request.check_name();
    Ok(WatchTarget {
        pull_request,
        head_sha,
        check_name,
    })
}

/// Drives the poll loop for one resolved target.
pub struct BuildWatcher<'a> {
    ci: &'a dyn CiSource,
    cluster: &'a dyn ClusterSource,
    observer: &'a dyn WatchObserver,
    options: WatchOptions,
}

impl<'a> BuildWatcher<'a> {
    pub fn new(
        ci: &'a dyn CiSource,
        cluster: &'a dyn ClusterSource,
        observer: &'a dyn WatchObserver,
        options: WatchOptions,
    ) -> Self {
        Self {
            ci,
            cluster,
            observer,
            options,
        }
    }

    /// Resolve the target and watch it, with the whole run bounded by
    /// `options.timeout` from now.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        on_target: impl FnOnce(&WatchTarget),
    ) -> WatchOutcome {
        let deadline = Instant::now() + self.options.timeout;
        let resolved = bounded(resolve_watch_target(self.cluster, self.ci), deadline, cancel).await;
        let target = match resolved {
            Ok(Ok(target)) => target,
            Ok(Err(err)) => {
                let outcome = WatchOutcome::Errored {
                    message: err.to_string(),
                };
                self.observer.failure(&format!("Error: {err}"));
                obs::emit_watch_finished("", &outcome);
                return outcome;
            }
            Err(halt) => return self.halted("", halt),
        };
        on_target(&target);
        self.watch(&target, deadline, cancel).await
    }

    /// Poll immediately, then every `interval`, until the check-run completes
    /// or `deadline`/`cancel` stops the loop.
    pub async fn watch(
        &self,
        target: &WatchTarget,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> WatchOutcome {
        let check = target.check_name.as_str();
        let mut query = CheckRunQuery {
            sha: target.head_sha.clone(),
            check_name: target.check_name.clone(),
            etag: None,
        };
        let mut state = CheckRunPollState::default();
        let interval = self.options.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match bounded(self.ci.poll_check_run(&query), deadline, cancel).await {
                Err(halt) => return self.halted(check, halt),
                Ok(Err(err)) => {
                    obs::emit_poll_failed(check, &err);
                    self.observer
                        .progress(&format!("{check}: error ({err}), retrying..."));
                }
                Ok(Ok(polled)) => {
                    state = polled.following(&state);
                    query.etag = state.etag.clone();
                    obs::emit_polled(check, &state);

                    if let Some(outcome) = self.conclude(check, &state) {
                        if outcome == WatchOutcome::Succeeded && self.options.restart_on_success {
                            self.restart(cancel).await;
                        }
                        obs::emit_watch_finished(check, &outcome);
                        return outcome;
                    }
                    self.observer.progress(&describe_progress(check, &state));
                }
            }

            if let Err(halt) = bounded(ticker.tick(), deadline, cancel).await {
                return self.halted(check, halt);
            }
        }
    }

    fn conclude(&self, check: &str, state: &CheckRunPollState) -> Option<WatchOutcome> {
        if !state.is_completed() {
            return None;
        }
        let conclusion = state.conclusion.as_str();
        let message = match conclusion {
            CONCLUSION_SUCCESS => {
                self.observer
                    .success(&format!("{check} completed successfully"));
                return Some(WatchOutcome::Succeeded);
            }
            CONCLUSION_FAILURE => format!("{check} failed"),
            CONCLUSION_CANCELLED => format!("{check} was cancelled"),
            CONCLUSION_TIMED_OUT => format!("{check} timed out"),
            other => format!("{check} completed with: {other}"),
        };
        self.observer.failure(&message);
        Some(WatchOutcome::Concluded {
            conclusion: conclusion.to_string(),
        })
    }

    fn halted(&self, check: &str, halt: Halt) -> WatchOutcome {
        let outcome = match halt {
            Halt::DeadlineExceeded => {
                self.observer
                    .failure("Timeout waiting for build to complete");
                WatchOutcome::TimedOut
            }
            Halt::Interrupted => {
                self.observer.failure("Interrupted");
                WatchOutcome::Interrupted
            }
        };
        obs::emit_watch_finished(check, &outcome);
        outcome
    }

    /// Best effort: failures are reported but never change the outcome.
    async fn restart(&self, cancel: &CancellationToken) {
        self.observer.notice("Restarting deployment...");
        let deadline = Instant::now() + self.options.restart_timeout;
        let result = match bounded(self.cluster.restart_deployment(), deadline, cancel).await {
            Ok(result) => result,
            Err(halt) => Err(halt.into()),
        };
        match result {
            Ok(()) => self.observer.success("Deployment restarted"),
            Err(err) => {
                warn!(event = "watch.restart_failed", error = %err);
                self.observer.failure(&format!("Restart failed: {err}"));
            }
        }
    }
}

fn describe_progress(check: &str, state: &CheckRunPollState) -> String {
    if state.not_modified {
        return format!("{check}: no change");
    }
    match state.status.as_str() {
        STATUS_QUEUED => format!("{check}: queued"),
        STATUS_IN_PROGRESS => format!("{check}: in progress"),
        "" => format!("{check}: waiting for check to appear..."),
        other => format!("{check}: {other}"),
    }
}
