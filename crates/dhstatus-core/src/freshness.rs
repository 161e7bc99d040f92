//! Freshness evaluation: registry digest first, CI check-run second.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::build::{
    CONCLUSION_FAILURE, CONCLUSION_SUCCESS, STATUS_IN_PROGRESS, STATUS_QUEUED,
};
use crate::domain::{BuildInfo, ClusterSnapshot, RegistryVerdict};

/// Whether the running pod reflects the latest build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    UpToDate,
    Outdated,
    BuildFailed,
    WaitingForCi,
    Building,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::UpToDate => "up_to_date",
            Verdict::Outdated => "outdated",
            Verdict::BuildFailed => "build_failed",
            Verdict::WaitingForCi => "waiting_for_ci",
            Verdict::Building => "building",
            Verdict::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signal a verdict was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evidence {
    DigestMatches,
    DigestDiffers {
        registry_digest: String,
    },
    CheckRunning {
        status: String,
    },
    PodNewerThanBuild {
        pod_created: DateTime<Utc>,
        build_completed: DateTime<Utc>,
    },
    BuildNewerThanPod {
        pod_created: DateTime<Utc>,
        build_completed: DateTime<Utc>,
    },
    CheckFailed,
    /// Check-run in a state the evaluator cannot interpret.
    CheckStatus {
        status: String,
    },
    CheckNotStarted,
    RegistryError {
        message: String,
    },
    NoData,
}

/// Verdict plus the evidence behind it. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub verdict: Verdict,
    pub evidence: Evidence,
}

impl Freshness {
    fn new(verdict: Verdict, evidence: Evidence) -> Self {
        Self { verdict, evidence }
    }

    /// Restarting the pod would pick up a newer image.
    pub fn needs_restart(&self) -> bool {
        self.verdict == Verdict::Outdated
    }
}

/// Decide freshness in strict priority order:
///
/// 1. tag present with a known digest: digest comparison decides;
/// 2. CI check-run with a status: running, success-by-time, failure, or unknown;
/// 3. CI correlation without a check-run yet: waiting;
/// 4. registry probe errored: unknown with the error;
/// 5. nothing to go on: unknown.
pub fn evaluate(
    snapshot: &ClusterSnapshot,
    build: Option<&BuildInfo>,
    registry: Option<&RegistryVerdict>,
) -> Freshness {
    if let Some(digest) = registry.and_then(RegistryVerdict::known_digest) {
        let matches = registry.is_some_and(|r| r.digest_match);
        return if matches {
            Freshness::new(Verdict::UpToDate, Evidence::DigestMatches)
        } else {
            Freshness::new(
                Verdict::Outdated,
                Evidence::DigestDiffers {
                    registry_digest: digest.to_string(),
                },
            )
        };
    }

    if let Some(build) = build {
        if !build.status.is_empty() {
            return evaluate_check_run(snapshot.pod_created, build);
        }
        return Freshness::new(Verdict::WaitingForCi, Evidence::CheckNotStarted);
    }

    if let Some(error) = registry.and_then(|r| r.error.as_ref()) {
        return Freshness::new(
            Verdict::Unknown,
            Evidence::RegistryError {
                message: error.to_string(),
            },
        );
    }

    Freshness::new(Verdict::Unknown, Evidence::NoData)
}

fn evaluate_check_run(pod_created: DateTime<Utc>, build: &BuildInfo) -> Freshness {
    let status = build.status.as_str();
    if status == STATUS_QUEUED || status == STATUS_IN_PROGRESS {
        return Freshness::new(
            Verdict::Building,
            Evidence::CheckRunning {
                status: status.to_string(),
            },
        );
    }

    match (build.conclusion.as_str(), build.completed_at) {
        (CONCLUSION_SUCCESS, Some(build_completed)) => {
            if pod_created > build_completed {
                Freshness::new(
                    Verdict::UpToDate,
                    Evidence::PodNewerThanBuild {
                        pod_created,
                        build_completed,
                    },
                )
            } else {
                Freshness::new(
                    Verdict::Outdated,
                    Evidence::BuildNewerThanPod {
                        pod_created,
                        build_completed,
                    },
                )
            }
        }
        (CONCLUSION_FAILURE, _) => Freshness::new(Verdict::BuildFailed, Evidence::CheckFailed),
        _ => Freshness::new(
            Verdict::Unknown,
            Evidence::CheckStatus {
                status: status.to_string(),
            },
        ),
    }
}
