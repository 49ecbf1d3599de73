pub mod live;
pub mod memory;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Endpoints, PersistentVolumeClaim, Pod, Service};

pub use live::KubeClusterClient;
pub use memory::InMemoryClusterClient;

/// Result type for cluster client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the cluster
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Failed to infer cluster configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("Failed to read manifests: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifests: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("Listing {kind} failed: {message}")]
    ListFailed { kind: String, message: String },
}

/// Read access to the resource kinds the analyzers inspect.
///
/// Every method lists objects in `namespace`; an empty namespace means all
/// namespaces.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_cron_jobs(&self, namespace: &str) -> ClientResult<Vec<CronJob>>;

    async fn list_pods(&self, namespace: &str) -> ClientResult<Vec<Pod>>;

    async fn list_services(&self, namespace: &str) -> ClientResult<Vec<Service>>;

    async fn list_endpoints(&self, namespace: &str) -> ClientResult<Vec<Endpoints>>;

    async fn list_deployments(&self, namespace: &str) -> ClientResult<Vec<Deployment>>;

    async fn list_persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<PersistentVolumeClaim>>;

    async fn list_horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> ClientResult<Vec<HorizontalPodAutoscaler>>;
}
