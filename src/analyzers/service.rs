use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "Service";

/// Flags selector-based services without ready endpoints
pub struct ServiceAnalyzer;

impl ServiceAnalyzer {
    fn evaluate(service: &Service, endpoints: &[Endpoints]) -> Vec<Failure> {
        let namespace = service.namespace().unwrap_or_default();
        let name = service.name_any();

        let Some(spec) = service.spec.as_ref() else {
            return Vec::new();
        };
        // Services without a selector have their endpoints managed by hand.
        let selector = match spec.selector.as_ref() {
            Some(selector) if !selector.is_empty() => selector,
            _ => return Vec::new(),
        };
        if spec.type_.as_deref() == Some("ExternalName") {
            return Vec::new();
        }

        let subsets = endpoints
            .iter()
            .find(|ep| ep.namespace().unwrap_or_default() == namespace && ep.name_any() == name)
            .and_then(|ep| ep.subsets.as_ref());

        let ready = subsets
            .iter()
            .flat_map(|subsets| subsets.iter())
            .flat_map(|subset| subset.addresses.iter().flatten())
            .count();
        let not_ready: Vec<String> = subsets
            .iter()
            .flat_map(|subsets| subsets.iter())
            .flat_map(|subset| subset.not_ready_addresses.iter().flatten())
            .map(|address| {
                address
                    .target_ref
                    .as_ref()
                    .and_then(|target| target.name.clone())
                    .unwrap_or_else(|| address.ip.clone())
            })
            .collect();

        if ready == 0 && not_ready.is_empty() {
            return selector
                .iter()
                .map(|(key, value)| {
                    Failure::new(format!(
                        "Service {} has no endpoints, expected label {}={}",
                        name, key, value
                    ))
                    .with_sensitive(namespace.clone())
                    .with_sensitive(name.clone())
                    .with_sensitive(key.clone())
                    .with_sensitive(value.clone())
                })
                .collect();
        }

        if not_ready.is_empty() {
            return Vec::new();
        }

        let mut failure = Failure::new(format!(
            "Service {} has {} not ready endpoint(s), pods: {}",
            name,
            not_ready.len(),
            not_ready.join(", ")
        ))
        .with_sensitive(namespace.clone())
        .with_sensitive(name.clone());
        for pod in not_ready {
            failure = failure.with_sensitive(pod);
        }
        vec![failure]
    }
}

#[async_trait]
impl Analyzer for ServiceAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let services = ctx.list(KIND, ctx.client.list_services(&ctx.namespace)).await?;
        let endpoints = ctx.list(KIND, ctx.client.list_endpoints(&ctx.namespace)).await?;
        debug!(
            "Evaluating {} services against {} endpoints",
            services.len(),
            endpoints.len()
        );

        let mut pre_analysis = PreAnalysis::new();
        for service in &services {
            pre_analysis.record(
                &service.namespace().unwrap_or_default(),
                &service.name_any(),
                Self::evaluate(service, &endpoints),
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!("Service analysis completed with {} results", results.len());
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Services whose selector matches no ready endpoints"
    }
}
