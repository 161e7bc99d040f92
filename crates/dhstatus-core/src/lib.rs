//! deckhouse-status core library
//!
//! Reconciles the running pod, the CI check-run and the registry digest into
//! a freshness verdict, and drives the watch-build poll loop.

pub mod deadline;
pub mod domain;
pub mod fakes;
pub mod freshness;
pub mod obs;
pub mod sources;
pub mod status;
pub mod telemetry;
pub mod watch;

pub use deadline::{bounded, Halt};

pub use domain::{
    BuildInfo, CheckRunPollState, CheckRunQuery, ClusterSnapshot, ImageRef, PullRequestTag,
    RegistryCredentials, RegistryVerdict, SourceError, SourceResult, WatchError,
};

pub use freshness::{evaluate, Evidence, Freshness, Verdict};

pub use sources::{CiSource, ClusterSource, RegistrySource};

pub use status::{collect_status, StatusOptions, StatusReport};

pub use telemetry::init_tracing;

pub use watch::{
    resolve_watch_target, BuildWatcher, WatchObserver, WatchOptions, WatchOutcome, WatchTarget,
};

/// Crate version, shown by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
