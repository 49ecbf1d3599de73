pub mod cronjob;
pub mod deployment;
pub mod hpa;
pub mod pod;
pub mod pvc;
pub mod service;
pub mod types;

use crate::client::{ClientError, ClientResult, ClusterClient};
use crate::filters::{FilterCatalog, FilterGroup};
use crate::metrics::{AnalyzerMetrics, SharedAnalyzerMetrics};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use types::{object_key, AnalysisResult, Failure, PreAnalysis, Sensitive};

/// Result type for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors that stop an analyzer before it can evaluate any object
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("failed to list {kind}: {source}")]
    List { kind: String, source: ClientError },

    #[error("{kind} analysis was cancelled")]
    Cancelled { kind: String },

    #[error("{kind} analyzer aborted: {message}")]
    Aborted { kind: String, message: String },
}

impl AnalyzerError {
    pub fn kind(&self) -> &str {
        match self {
            AnalyzerError::List { kind, .. }
            | AnalyzerError::Cancelled { kind }
            | AnalyzerError::Aborted { kind, .. } => kind,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalyzerError::Cancelled { .. })
    }
}

/// Everything an analyzer needs for one run.
#[derive(Clone)]
pub struct ExecutionContext {
    pub client: Arc<dyn ClusterClient>,
    /// Empty means all namespaces
    pub namespace: String,
    pub cancellation: CancellationToken,
    pub metrics: SharedAnalyzerMetrics,
}

impl ExecutionContext {
    pub fn new(client: Arc<dyn ClusterClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            cancellation: CancellationToken::new(),
            metrics: AnalyzerMetrics::global(),
        }
    }

    pub fn with_metrics(mut self, metrics: SharedAnalyzerMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Await a listing call unless the run is cancelled first.
    pub async fn list<T, F>(&self, kind: &str, request: F) -> AnalyzerResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(AnalyzerError::Cancelled {
                kind: kind.to_string(),
            }),
            result = request => result.map_err(|source| AnalyzerError::List {
                kind: kind.to_string(),
                source,
            }),
        }
    }

    /// Set one gauge per failing object and fold the working set into results.
    pub fn publish(&self, kind: &str, pre_analysis: PreAnalysis) -> Vec<AnalysisResult> {
        for (namespace, name, failures) in pre_analysis.failure_counts() {
            self.metrics.set(kind, name, namespace, failures);
        }
        pre_analysis.into_results(kind)
    }
}

/// Base trait for analyzers
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// List the objects of one kind and report every object that breaks a rule
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>>;

    /// Resource kind reported in results and metrics
    fn kind(&self) -> &str;

    fn description(&self) -> &str;
}

/// Errors raised while registering analyzers
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("filter {name} is already registered as a {group} filter")]
    DuplicateFilter { name: String, group: FilterGroup },
}

struct RegisteredAnalyzer {
    name: String,
    group: FilterGroup,
    analyzer: Arc<dyn Analyzer>,
}

/// Analyzers addressable by filter name
pub struct AnalyzerRegistry {
    analyzers: Vec<RegisteredAnalyzer>,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Registry holding every analyzer compiled into the crate.
    pub fn with_builtin() -> Self {
        let builtin: Vec<(FilterGroup, Arc<dyn Analyzer>)> = vec![
            (FilterGroup::Core, Arc::new(pod::PodAnalyzer)),
            (FilterGroup::Core, Arc::new(deployment::DeploymentAnalyzer)),
            (FilterGroup::Core, Arc::new(pvc::PersistentVolumeClaimAnalyzer)),
            (FilterGroup::Core, Arc::new(service::ServiceAnalyzer)),
            (FilterGroup::Core, Arc::new(cronjob::CronJobAnalyzer)),
            (FilterGroup::Additional, Arc::new(hpa::HorizontalPodAutoscalerAnalyzer)),
        ];

        let mut registry = Self::new();
        for (group, analyzer) in builtin {
            registry.analyzers.push(RegisteredAnalyzer {
                name: analyzer.kind().to_string(),
                group,
                analyzer,
            });
        }
        registry
    }

    /// Register an analyzer under a filter name that is not yet taken in any group.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        group: FilterGroup,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if let Some(existing) = self.analyzers.iter().find(|a| a.name == name) {
            return Err(RegistryError::DuplicateFilter {
                name,
                group: existing.group,
            });
        }

        tracing::debug!("Registered {} filter {}", group, name);
        self.analyzers.push(RegisteredAnalyzer {
            name,
            group,
            analyzer,
        });
        Ok(())
    }

    /// Register an externally provided analyzer.
    pub fn register_integration(
        &mut self,
        name: impl Into<String>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<(), RegistryError> {
        self.register(name, FilterGroup::Integration, analyzer)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers
            .iter()
            .find(|a| a.name == name)
            .map(|a| Arc::clone(&a.analyzer))
    }

    /// The core, additional and integration filter names.
    pub fn list_filters(&self) -> FilterCatalog {
        let names = |group: FilterGroup| -> Vec<String> {
            self.analyzers
                .iter()
                .filter(|a| a.group == group)
                .map(|a| a.name.clone())
                .collect()
        };

        FilterCatalog::new(
            names(FilterGroup::Core),
            names(FilterGroup::Additional),
            names(FilterGroup::Integration),
        )
    }

    pub fn list(&self) -> Vec<String> {
        self.analyzers.iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::client::InMemoryClusterClient;

    /// Context over the given manifests with metrics isolated from the global registry.
    pub fn context_for(manifests: &str) -> (ExecutionContext, SharedAnalyzerMetrics) {
        let client = InMemoryClusterClient::from_manifests_str(manifests).unwrap();
        context_with_client(client)
    }

    pub fn context_with_client(client: InMemoryClusterClient) -> (ExecutionContext, SharedAnalyzerMetrics) {
        let metrics = Arc::new(AnalyzerMetrics::new().unwrap());
        let ctx = ExecutionContext::new(Arc::new(client), "").with_metrics(Arc::clone(&metrics));
        (ctx, metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;

    struct VulnerabilityReportAnalyzer;

    #[async_trait]
    impl Analyzer for VulnerabilityReportAnalyzer {
        async fn analyze(&self, _ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
            Ok(Vec::new())
        }

        fn kind(&self) -> &str {
            "VulnerabilityReport"
        }

        fn description(&self) -> &str {
            "Test integration"
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let registry = AnalyzerRegistry::with_builtin();
        let catalog = registry.list_filters();

        assert_eq!(
            catalog.core(),
            ["Pod", "Deployment", "PersistentVolumeClaim", "Service", "CronJob"]
        );
        assert_eq!(catalog.additional(), ["HorizontalPodAutoscaler"]);
        assert!(catalog.integration().is_empty());
    }

    #[test]
    fn test_register_integration() {
        let mut registry = AnalyzerRegistry::with_builtin();
        registry
            .register_integration("VulnerabilityReport", Arc::new(VulnerabilityReportAnalyzer))
            .unwrap();

        let catalog = registry.list_filters();
        assert_eq!(catalog.integration(), ["VulnerabilityReport"]);
        assert_eq!(
            catalog.group_of("VulnerabilityReport"),
            Some(FilterGroup::Integration)
        );
        assert!(registry.get("VulnerabilityReport").is_some());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = AnalyzerRegistry::with_builtin();
        let err = registry
            .register_integration("CronJob", Arc::new(VulnerabilityReportAnalyzer))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::DuplicateFilter { group: FilterGroup::Core, .. }
        ));
        assert_eq!(registry.list_filters().integration().len(), 0);
    }

    #[test]
    fn test_get_unknown_filter() {
        let registry = AnalyzerRegistry::with_builtin();
        assert!(registry.get("Ingress").is_none());
    }

    #[tokio::test]
    async fn test_list_reports_cancellation() {
        let client = Arc::new(InMemoryClusterClient::new());
        let token = CancellationToken::new();
        let ctx = ExecutionContext::new(client.clone(), "").with_cancellation(token.clone());
        token.cancel();

        let err = ctx.list("Pod", client.list_pods("")).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.kind(), "Pod");
    }

    #[tokio::test]
    async fn test_list_maps_client_errors() {
        let client = Arc::new(InMemoryClusterClient::new().with_failure("Pod", "forbidden"));
        let ctx = ExecutionContext::new(client.clone(), "");

        let err = ctx.list("Pod", client.list_pods("")).await.unwrap_err();
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("forbidden"));
    }
}
