//! Kubernetes collaborator for deckhouse-status
//!
//! Captures the running pod of the watched deployment, reads registry
//! credentials from its pull secret, and triggers rollout restarts.

pub mod client;
pub mod config;
pub mod creds;
pub mod snapshot;

pub use client::KubeCluster;
pub use config::ClusterTarget;
pub use creds::credentials_for_host;
pub use snapshot::{digest_from_image_id, restart_patch, select_pod, snapshot_from_pod};
