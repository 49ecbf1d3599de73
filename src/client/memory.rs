use super::{ClientError, ClientResult, ClusterClient};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Endpoints, PersistentVolumeClaim, Pod, Service};
use kube::{Resource, ResourceExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Cluster client serving objects loaded from YAML manifests.
///
/// Used for offline analysis of exported cluster state and as the client in
/// tests. Listing a kind registered with [`InMemoryClusterClient::with_failure`]
/// fails the way an unreachable API server would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClusterClient {
    cron_jobs: Vec<CronJob>,
    pods: Vec<Pod>,
    services: Vec<Service>,
    endpoints: Vec<Endpoints>,
    deployments: Vec<Deployment>,
    persistent_volume_claims: Vec<PersistentVolumeClaim>,
    horizontal_pod_autoscalers: Vec<HorizontalPodAutoscaler>,
    failures: HashMap<String, String>,
}

impl InMemoryClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every supported object from a multi-document YAML string.
    /// `kind: List` documents are flattened.
    pub fn from_manifests_str(content: &str) -> ClientResult<Self> {
        let mut client = Self::new();
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)?;
            client.add_document(value)?;
        }
        Ok(client)
    }

    pub fn from_manifest_file(path: &Path) -> ClientResult<Self> {
        info!("Loading manifests from {}", path.display());
        let content = fs::read_to_string(path)?;
        let client = Self::from_manifests_str(&content)?;
        info!("Loaded {} objects from manifests", client.object_count());
        Ok(client)
    }

    /// Make every listing of `kind` fail with `message`.
    pub fn with_failure(mut self, kind: &str, message: &str) -> Self {
        self.failures.insert(kind.to_string(), message.to_string());
        self
    }

    pub fn object_count(&self) -> usize {
        self.cron_jobs.len()
            + self.pods.len()
            + self.services.len()
            + self.endpoints.len()
            + self.deployments.len()
            + self.persistent_volume_claims.len()
            + self.horizontal_pod_autoscalers.len()
    }

    fn add_document(&mut self, value: serde_yaml::Value) -> ClientResult<()> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "List" => {
                let items = value
                    .get("items")
                    .and_then(|items| items.as_sequence())
                    .cloned()
                    .unwrap_or_default();
                for item in items {
                    self.add_document(item)?;
                }
            }
            "CronJob" => self.cron_jobs.push(serde_yaml::from_value(value)?),
            "Pod" => self.pods.push(serde_yaml::from_value(value)?),
            "Service" => self.services.push(serde_yaml::from_value(value)?),
            "Endpoints" => self.endpoints.push(serde_yaml::from_value(value)?),
            "Deployment" => self.deployments.push(serde_yaml::from_value(value)?),
            "PersistentVolumeClaim" => self
                .persistent_volume_claims
                .push(serde_yaml::from_value(value)?),
            "HorizontalPodAutoscaler" => self
                .horizontal_pod_autoscalers
                .push(serde_yaml::from_value(value)?),
            "" => {}
            other => debug!("Skipping manifest of unsupported kind {}", other),
        }

        Ok(())
    }

    fn list<K>(&self, kind: &str, items: &[K], namespace: &str) -> ClientResult<Vec<K>>
    where
        K: Resource + Clone,
    {
        if let Some(message) = self.failures.get(kind) {
            return Err(ClientError::ListFailed {
                kind: kind.to_string(),
                message: message.clone(),
            });
        }

        Ok(items
            .iter()
            .filter(|item| namespace.is_empty() || item.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ClusterClient for InMemoryClusterClient {
    async fn list_cron_jobs(&self, namespace: &str) -> ClientResult<Vec<CronJob>> {
        self.list("CronJob", &self.cron_jobs, namespace)
    }

    async fn list_pods(&self, namespace: &str) -> ClientResult<Vec<Pod>> {
        self.list("Pod", &self.pods, namespace)
    }

    async fn list_services(&self, namespace: &str) -> ClientResult<Vec<Service>> {
        self.list("Service", &self.services, namespace)
    }

    async fn list_endpoints(&self, namespace: &str) -> ClientResult<Vec<Endpoints>> {
        self.list("Endpoints", &self.endpoints, namespace)
    }

    async fn list_deployments(&self, namespace: &str) -> ClientResult<Vec<Deployment>> {
        self.list("Deployment", &self.deployments, namespace)
    }

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<PersistentVolumeClaim>> {
        self.list("PersistentVolumeClaim", &self.persistent_volume_claims, namespace)
    }

    async fn list_horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<HorizontalPodAutoscaler>> {
        self.list("HorizontalPodAutoscaler", &self.horizontal_pod_autoscalers, namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFESTS: &str = r#"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: backup
  namespace: ops
spec:
  schedule: "0 3 * * *"
  jobTemplate:
    spec:
      template:
        spec:
          containers: []
---
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Pod
    metadata:
      name: web-0
      namespace: default
  - apiVersion: v1
    kind: Pod
    metadata:
      name: worker-0
      namespace: jobs
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: ignored
  namespace: default
"#;

    #[tokio::test]
    async fn test_loads_documents_and_lists() {
        let client = InMemoryClusterClient::from_manifests_str(MANIFESTS).unwrap();
        assert_eq!(client.object_count(), 3);

        let cron_jobs = client.list_cron_jobs("").await.unwrap();
        assert_eq!(cron_jobs.len(), 1);
        assert_eq!(cron_jobs[0].name_any(), "backup");
    }

    #[tokio::test]
    async fn test_namespace_scope() {
        let client = InMemoryClusterClient::from_manifests_str(MANIFESTS).unwrap();

        let all = client.list_pods("").await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = client.list_pods("jobs").await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].name_any(), "worker-0");

        assert!(client.list_pods("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let client = InMemoryClusterClient::from_manifests_str(MANIFESTS)
            .unwrap()
            .with_failure("CronJob", "the server could not find the requested resource");

        let err = client.list_cron_jobs("").await.unwrap_err();
        assert!(matches!(err, ClientError::ListFailed { ref kind, .. } if kind == "CronJob"));
        assert!(client.list_pods("").await.is_ok());
    }

    #[test]
    fn test_invalid_manifest_is_rejected() {
        let result = InMemoryClusterClient::from_manifests_str("kind: Pod\nmetadata: [not, a, map]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.yaml");
        std::fs::write(&path, MANIFESTS).unwrap();

        let client = InMemoryClusterClient::from_manifest_file(&path).unwrap();
        assert_eq!(client.object_count(), 3);
    }
}
