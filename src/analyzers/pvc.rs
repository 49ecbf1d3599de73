use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "PersistentVolumeClaim";

/// Flags claims stuck in the Pending phase
pub struct PersistentVolumeClaimAnalyzer;

impl PersistentVolumeClaimAnalyzer {
    fn evaluate(claim: &PersistentVolumeClaim) -> Vec<Failure> {
        let namespace = claim.namespace().unwrap_or_default();
        let name = claim.name_any();

        let Some(status) = claim.status.as_ref() else {
            return Vec::new();
        };
        if status.phase.as_deref() != Some("Pending") {
            return Vec::new();
        }

        let reason = status
            .conditions
            .iter()
            .flatten()
            .filter_map(|condition| condition.message.as_deref())
            .last();

        let text = match reason {
            Some(message) => format!("PersistentVolumeClaim {} is pending: {}", name, message),
            None => format!("PersistentVolumeClaim {} is pending", name),
        };

        vec![Failure::new(text)
            .with_sensitive(namespace.clone())
            .with_sensitive(name.clone())]
    }
}

#[async_trait]
impl Analyzer for PersistentVolumeClaimAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let claims = ctx
            .list(KIND, ctx.client.list_persistent_volume_claims(&ctx.namespace))
            .await?;
        debug!("Evaluating {} persistent volume claims", claims.len());

        let mut pre_analysis = PreAnalysis::new();
        for claim in &claims {
            pre_analysis.record(
                &claim.namespace().unwrap_or_default(),
                &claim.name_any(),
                Self::evaluate(claim),
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!(
            "PersistentVolumeClaim analysis completed with {} results",
            results.len()
        );
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Persistent volume claims that are not bound"
    }
}
