//! Live cluster state captured once per invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::image::ImageRef;
use crate::domain::tag::PullRequestTag;

/// Basic-auth material for the image registry (base64 `user:password`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    pub auth: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("auth", &"<redacted>")
            .finish()
    }
}

/// The deployment's pod as observed at fetch time. Immutable after fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Full image reference as written in the pod spec.
    pub image: String,
    pub image_ref: ImageRef,
    pub pod_name: String,
    pub pod_created: DateTime<Utc>,
    pub pod_phase: String,
    /// Digest of the image the container actually runs (`sha256:...`).
    pub running_digest: Option<String>,
    pub registry_credentials: Option<RegistryCredentials>,
}

impl ClusterSnapshot {
    pub fn pull_request(&self) -> PullRequestTag {
        PullRequestTag::parse(&self.image_ref.tag)
    }

    pub fn tag(&self) -> &str {
        &self.image_ref.tag
    }
}
