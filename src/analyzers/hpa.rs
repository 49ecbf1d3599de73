use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "HorizontalPodAutoscaler";

const SCALABLE_KINDS: &[&str] = &["Deployment", "ReplicaSet", "StatefulSet", "ReplicationController"];

/// Flags autoscalers pointing at unscalable kinds or missing deployments
pub struct HorizontalPodAutoscalerAnalyzer;

impl HorizontalPodAutoscalerAnalyzer {
    fn evaluate(hpa: &HorizontalPodAutoscaler, deployments: &[Deployment]) -> Vec<Failure> {
        let namespace = hpa.namespace().unwrap_or_default();
        let name = hpa.name_any();

        let Some(spec) = hpa.spec.as_ref() else {
            return Vec::new();
        };
        let target = &spec.scale_target_ref;

        let text = if !SCALABLE_KINDS.contains(&target.kind.as_str()) {
            format!(
                "HorizontalPodAutoscaler {} uses {}/{} as ScaleTargetRef which is not an option",
                name, target.kind, target.name
            )
        } else if target.kind == "Deployment"
            && !deployments.iter().any(|deployment| {
                deployment.name_any() == target.name
                    && deployment.namespace().unwrap_or_default() == namespace
            })
        {
            format!(
                "HorizontalPodAutoscaler {} uses {}/{} as ScaleTargetRef which does not exist",
                name, target.kind, target.name
            )
        } else {
            return Vec::new();
        };

        vec![Failure::new(text)
            .with_sensitive(namespace.clone())
            .with_sensitive(name.clone())
            .with_sensitive(target.name.clone())]
    }
}

#[async_trait]
impl Analyzer for HorizontalPodAutoscalerAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let autoscalers = ctx
            .list(KIND, ctx.client.list_horizontal_pod_autoscalers(&ctx.namespace))
            .await?;
        let deployments = ctx
            .list(KIND, ctx.client.list_deployments(&ctx.namespace))
            .await?;
        debug!("Evaluating {} horizontal pod autoscalers", autoscalers.len());

        let mut pre_analysis = PreAnalysis::new();
        for hpa in &autoscalers {
            pre_analysis.record(
                &hpa.namespace().unwrap_or_default(),
                &hpa.name_any(),
                Self::evaluate(hpa, &deployments),
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!(
            "HorizontalPodAutoscaler analysis completed with {} results",
            results.len()
        );
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Autoscalers with invalid or missing scale targets"
    }
}
