//! Pod selection and snapshot extraction (pure, no API calls).

use chrono::{DateTime, Utc};
use dhstatus_core::{ClusterSnapshot, ImageRef, RegistryCredentials};
use k8s_openapi::api::core::v1::Pod;
use serde_json::json;

pub const POD_RUNNING: &str = "Running";
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// The first `Running` pod, otherwise the first pod.
pub fn select_pod(pods: &[Pod]) -> Option<&Pod> {
    pods.iter()
        .find(|pod| pod_phase(pod) == POD_RUNNING)
        .or_else(|| pods.first())
}

fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or_default()
}

/// `docker-pullable://host/repo@sha256:...` → `sha256:...`
pub fn digest_from_image_id(image_id: &str) -> Option<&str> {
    image_id
        .split_once('@')
        .map(|(_, digest)| digest)
        .filter(|d| !d.is_empty())
}

/// Capture the fields the evaluator needs from `pod`. The first container is
/// the application container.
pub fn snapshot_from_pod(pod: &Pod, credentials: Option<RegistryCredentials>) -> ClusterSnapshot {
    let image = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.containers.first())
        .and_then(|c| c.image.clone())
        .unwrap_or_default();

    let running_digest = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.first())
        .and_then(|cs| digest_from_image_id(&cs.image_id))
        .map(str::to_string);

    let pod_created = pod
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|t| t.0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    ClusterSnapshot {
        image_ref: ImageRef::parse(&image),
        image,
        pod_name: pod.metadata.name.clone().unwrap_or_default(),
        pod_created,
        pod_phase: pod_phase(pod).to_string(),
        running_digest,
        registry_credentials: credentials,
    }
}

/// Merge patch that makes the deployment controller roll its pods,
/// the same way `kubectl rollout restart` does.
pub fn restart_patch(now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTARTED_AT_ANNOTATION: now.to_rfc3339()
                    }
                }
            }
        }
    })
}
