use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "Deployment";

/// Flags deployments whose ready replica count differs from the desired count
pub struct DeploymentAnalyzer;

impl DeploymentAnalyzer {
    fn evaluate(deployment: &Deployment) -> Vec<Failure> {
        let namespace = deployment.namespace().unwrap_or_default();
        let name = deployment.name_any();

        // The API server defaults an unset replica count to one.
        let desired = deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(1);
        let ready = deployment
            .status
            .as_ref()
            .and_then(|status| status.ready_replicas)
            .unwrap_or(0);

        if desired == ready {
            return Vec::new();
        }

        vec![Failure::new(format!(
            "Deployment {}/{} has {} replicas but {} are ready",
            namespace, name, desired, ready
        ))
        .with_sensitive(namespace.clone())
        .with_sensitive(name.clone())]
    }
}

#[async_trait]
impl Analyzer for DeploymentAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let deployments = ctx
            .list(KIND, ctx.client.list_deployments(&ctx.namespace))
            .await?;
        debug!("Evaluating {} deployments", deployments.len());

        let mut pre_analysis = PreAnalysis::new();
        for deployment in &deployments {
            pre_analysis.record(
                &deployment.namespace().unwrap_or_default(),
                &deployment.name_any(),
                Self::evaluate(deployment),
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!("Deployment analysis completed with {} results", results.len());
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Deployments without the desired number of ready replicas"
    }
}
