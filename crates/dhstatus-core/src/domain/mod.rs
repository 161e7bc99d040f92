//! Domain model for deckhouse-status.

pub mod build;
pub mod cluster;
pub mod error;
pub mod image;
pub mod registry;
pub mod tag;

pub use build::{BuildInfo, CheckRunPollState, CheckRunQuery};
pub use cluster::{ClusterSnapshot, RegistryCredentials};
pub use error::{SourceError, SourceResult, WatchError};
pub use image::ImageRef;
pub use registry::RegistryVerdict;
pub use tag::PullRequestTag;
