//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `FakeCluster`, `FakeCi`, `FakeRegistry` and `RecordingObserver`
//! with scripted answers and call recording, no network involved.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    BuildInfo, CheckRunPollState, CheckRunQuery, ClusterSnapshot, ImageRef, RegistryCredentials,
    RegistryVerdict, SourceError, SourceResult,
};
use crate::sources::{CiSource, ClusterSource, RegistrySource};
use crate::watch::WatchObserver;

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

/// Cluster that always reports the same snapshot.
#[derive(Debug)]
pub struct FakeCluster {
    snapshot: SourceResult<ClusterSnapshot>,
    restart: SourceResult<()>,
    restarts: AtomicUsize,
}

impl FakeCluster {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            snapshot: Ok(snapshot),
            restart: Ok(()),
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            snapshot: Err(error),
            restart: Ok(()),
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn with_restart_result(mut self, result: SourceResult<()>) -> Self {
        self.restart = result;
        self
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterSource for FakeCluster {
    async fn fetch_snapshot(&self) -> SourceResult<ClusterSnapshot> {
        self.snapshot.clone()
    }

    async fn restart_deployment(&self) -> SourceResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.restart.clone()
    }
}

// ---------------------------------------------------------------------------
// FakeCi
// ---------------------------------------------------------------------------

/// CI source with a scripted sequence of poll answers.
///
/// Polls pop answers in order; the last answer repeats once the script runs out.
#[derive(Debug)]
pub struct FakeCi {
    pr_info: SourceResult<BuildInfo>,
    head_sha: SourceResult<String>,
    polls: Mutex<VecDeque<SourceResult<CheckRunPollState>>>,
    queries: Mutex<Vec<CheckRunQuery>>,
    pr_info_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl Default for FakeCi {
    fn default() -> Self {
        Self {
            pr_info: Ok(BuildInfo::default()),
            head_sha: Ok("0123456789abcdef0123456789abcdef01234567".to_string()),
            polls: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            pr_info_calls: AtomicUsize::new(0),
            delay: None,
        }
    }
}

impl FakeCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pr_info(mut self, info: SourceResult<BuildInfo>) -> Self {
        self.pr_info = info;
        self
    }

    pub fn with_head_sha(mut self, sha: SourceResult<String>) -> Self {
        self.head_sha = sha;
        self
    }

    pub fn with_polls(self, polls: Vec<SourceResult<CheckRunPollState>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    /// Every call sleeps this long first (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn poll_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<CheckRunQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn pr_info_calls(&self) -> usize {
        self.pr_info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CiSource for FakeCi {
    async fn fetch_pr_info(
        &self,
        number: u64,
        check_name: &str,
        _skip_commit_details: bool,
    ) -> SourceResult<BuildInfo> {
        self.pr_info_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.pr_info.clone().map(|mut info| {
            info.number = number;
            info.check_name = check_name.to_string();
            info
        })
    }

    async fn fetch_head_sha(&self, _number: u64) -> SourceResult<String> {
        pause(self.delay).await;
        self.head_sha.clone()
    }

    async fn poll_check_run(&self, query: &CheckRunQuery) -> SourceResult<CheckRunPollState> {
        self.queries.lock().unwrap().push(query.clone());
        pause(self.delay).await;
        let mut polls = self.polls.lock().unwrap();
        match polls.len() {
            0 => Ok(CheckRunPollState::default()),
            1 => polls[0].clone(),
            _ => polls.pop_front().unwrap_or_else(|| Ok(CheckRunPollState::default())),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeRegistry
// ---------------------------------------------------------------------------

/// Registry that answers every check with the same verdict.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    verdict: RegistryVerdict,
    checks: Mutex<Vec<(ImageRef, Option<String>)>>,
    delay: Option<Duration>,
}

impl FakeRegistry {
    pub fn new(verdict: RegistryVerdict) -> Self {
        Self {
            verdict,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    pub fn checks(&self) -> Vec<(ImageRef, Option<String>)> {
        self.checks.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrySource for FakeRegistry {
    async fn check(
        &self,
        image: &ImageRef,
        running_digest: Option<&str>,
        _credentials: Option<&RegistryCredentials>,
    ) -> RegistryVerdict {
        self.checks
            .lock()
            .unwrap()
            .push((image.clone(), running_digest.map(str::to_string)));
        pause(self.delay).await;
        self.verdict.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

/// One line the watch loop reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedLine {
    Progress(String),
    Notice(String),
    Success(String),
    Failure(String),
}

/// Watch observer that keeps every reported line.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    lines: Mutex<Vec<ObservedLine>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ObservedLine> {
        self.lines.lock().unwrap().clone()
    }
}

impl WatchObserver for RecordingObserver {
    fn progress(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(ObservedLine::Progress(message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(ObservedLine::Notice(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(ObservedLine::Success(message.to_string()));
    }

    fn failure(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(ObservedLine::Failure(message.to_string()));
    }
}
