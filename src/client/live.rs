use super::{ClientResult, ClusterClient};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Endpoints, PersistentVolumeClaim, Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

/// Cluster client backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from an explicit kubeconfig and/or context, falling
    /// back to in-cluster or default kubeconfig inference.
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> ClientResult<Self> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };

        let config = match (kubeconfig, context) {
            (Some(path), _) => {
                info!("Using kubeconfig at {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options).await?,
            (None, None) => Config::infer().await?,
        };

        debug!("Connecting to cluster at {}", config.cluster_url);
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    async fn list_resource<K>(&self, namespace: &str) -> ClientResult<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        };

        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_cron_jobs(&self, namespace: &str) -> ClientResult<Vec<CronJob>> {
        self.list_resource(namespace).await
    }

    async fn list_pods(&self, namespace: &str) -> ClientResult<Vec<Pod>> {
        self.list_resource(namespace).await
    }

    async fn list_services(&self, namespace: &str) -> ClientResult<Vec<Service>> {
        self.list_resource(namespace).await
    }

    async fn list_endpoints(&self, namespace: &str) -> ClientResult<Vec<Endpoints>> {
        self.list_resource(namespace).await
    }

    async fn list_deployments(&self, namespace: &str) -> ClientResult<Vec<Deployment>> {
        self.list_resource(namespace).await
    }

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<PersistentVolumeClaim>> {
        self.list_resource(namespace).await
    }

    async fn list_horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<HorizontalPodAutoscaler>> {
        self.list_resource(namespace).await
    }
}
