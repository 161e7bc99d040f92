//! Cluster source backed by the Kubernetes API.

use async_trait::async_trait;
use chrono::Utc;
use dhstatus_core::{
    ClusterSnapshot, ClusterSource, RegistryCredentials, SourceError, SourceResult,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use tracing::debug;

use crate::config::ClusterTarget;
use crate::creds::{credentials_for_host, DOCKER_CONFIG_KEY};
use crate::snapshot::{restart_patch, select_pod, snapshot_from_pod};

fn cluster_err(context: &str, err: kube::Error) -> SourceError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => {
            SourceError::Cluster(format!("{context}: not found ({})", resp.message))
        }
        other => SourceError::Cluster(format!("{context}: {other}")),
    }
}

/// Production cluster source using the kube crate.
pub struct KubeCluster {
    client: Client,
    target: ClusterTarget,
}

impl KubeCluster {
    /// Connect using in-cluster service account config, else `KUBECONFIG`,
    /// else `~/.kube/config`.
    pub async fn connect(target: ClusterTarget) -> SourceResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| SourceError::Cluster(format!("cannot create k8s client: {e}")))?;
        debug!(namespace = %target.namespace, "k8s client initialized");
        Ok(Self { client, target })
    }

    pub fn from_client(client: Client, target: ClusterTarget) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &ClusterTarget {
        &self.target
    }

    async fn registry_credentials(&self, host: &str) -> SourceResult<RegistryCredentials> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.target.namespace);
        let secret = secrets
            .get(&self.target.registry_secret)
            .await
            .map_err(|e| cluster_err("get registry secret", e))?;
        let raw = secret
            .data
            .as_ref()
            .and_then(|data| data.get(DOCKER_CONFIG_KEY))
            .map(|bytes| bytes.0.as_slice())
            .unwrap_or_default();
        credentials_for_host(raw, host)
    }
}

#[async_trait]
impl ClusterSource for KubeCluster {
    async fn fetch_snapshot(&self) -> SourceResult<ClusterSnapshot> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.target.namespace);
        let lp = ListParams::default().labels(&self.target.label_selector);
        let pod_list = pods
            .list(&lp)
            .await
            .map_err(|e| cluster_err("cannot list pods", e))?;

        let pod = select_pod(&pod_list.items).ok_or_else(|| {
            SourceError::Cluster(format!(
                "no pods matching {} found in {}",
                self.target.label_selector, self.target.namespace
            ))
        })?;

        let mut snapshot = snapshot_from_pod(pod, None);
        match self.registry_credentials(&snapshot.image_ref.host).await {
            Ok(creds) => snapshot.registry_credentials = Some(creds),
            Err(err) => debug!(error = %err, "registry credentials unavailable"),
        }
        debug!(pod = %snapshot.pod_name, image = %snapshot.image, "cluster snapshot captured");
        Ok(snapshot)
    }

    async fn restart_deployment(&self) -> SourceResult<()> {
        let deployments: Api<Deployment> =
            Api::namespaced(self.client.clone(), &self.target.namespace);
        let patch = restart_patch(Utc::now());
        deployments
            .patch(
                &self.target.deployment,
                &PatchParams::default(),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| cluster_err("restart deployment", e))?;
        debug!(deployment = %self.target.deployment, "rollout restart requested");
        Ok(())
    }
}
