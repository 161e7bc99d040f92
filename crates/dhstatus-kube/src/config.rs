//! Which deployment to inspect.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "d8-system";
pub const DEFAULT_DEPLOYMENT: &str = "deckhouse";
pub const DEFAULT_LABEL_SELECTOR: &str = "app=deckhouse";
pub const DEFAULT_REGISTRY_SECRET: &str = "deckhouse-registry";

/// Namespace, deployment, pod selector and pull secret of the watched app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub namespace: String,
    pub deployment: String,
    pub label_selector: String,
    /// `kubernetes.io/dockerconfigjson` secret holding registry credentials
    pub registry_secret: String,
}

impl Default for ClusterTarget {
    fn default() -> Self {
        ClusterTarget {
            namespace: DEFAULT_NAMESPACE.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            registry_secret: DEFAULT_REGISTRY_SECRET.to_string(),
        }
    }
}
