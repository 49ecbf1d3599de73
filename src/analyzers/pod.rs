use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "Pod";

/// Waiting reasons that mean the container will not start without intervention
const ERROR_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "CreateContainerConfigError",
    "CreateContainerError",
    "InvalidImageName",
    "RunContainerError",
];

/// Flags unschedulable pods and containers stuck in an error waiting state
pub struct PodAnalyzer;

impl PodAnalyzer {
    fn evaluate(pod: &Pod) -> Vec<Failure> {
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();
        let failure = |text: String| {
            Failure::new(text)
                .with_sensitive(namespace.clone())
                .with_sensitive(name.clone())
        };

        let Some(status) = pod.status.as_ref() else {
            return Vec::new();
        };

        let mut failures = Vec::new();

        if status.phase.as_deref() == Some("Pending") {
            let unschedulable = status.conditions.iter().flatten().find(|condition| {
                condition.type_ == "PodScheduled"
                    && condition.status == "False"
                    && condition.reason.as_deref() == Some("Unschedulable")
            });
            if let Some(condition) = unschedulable {
                let message = condition.message.as_deref().unwrap_or("no message");
                failures.push(failure(format!(
                    "Pod {} cannot be scheduled: {}",
                    name, message
                )));
            }
        }

        let containers = status
            .init_container_statuses
            .iter()
            .flatten()
            .chain(status.container_statuses.iter().flatten());
        for container in containers {
            if let Some(text) = Self::waiting_error(&name, container) {
                failures.push(failure(text).with_sensitive(container.name.clone()));
            }
        }

        failures
    }

    fn waiting_error(pod_name: &str, container: &ContainerStatus) -> Option<String> {
        let waiting = container.state.as_ref()?.waiting.as_ref()?;
        let reason = waiting.reason.as_deref()?;
        if !ERROR_REASONS.contains(&reason) {
            return None;
        }

        let mut text = format!(
            "Container {} in Pod {} is waiting with reason {}",
            container.name, pod_name, reason
        );
        if let Some(message) = waiting.message.as_deref().filter(|m| !m.is_empty()) {
            text.push_str(&format!(": {}", message));
        }

        let last_termination = container
            .last_state
            .as_ref()
            .and_then(|state| state.terminated.as_ref())
            .and_then(|terminated| terminated.reason.as_deref());
        if let Some(last_reason) = last_termination {
            text.push_str(&format!(" (last termination reason: {})", last_reason));
        }

        Some(text)
    }
}

#[async_trait]
impl Analyzer for PodAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let pods = ctx.list(KIND, ctx.client.list_pods(&ctx.namespace)).await?;
        debug!("Evaluating {} pods", pods.len());

        let mut pre_analysis = PreAnalysis::new();
        for pod in &pods {
            pre_analysis.record(
                &pod.namespace().unwrap_or_default(),
                &pod.name_any(),
                Self::evaluate(pod),
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!("Pod analysis completed with {} results", results.len());
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Unschedulable pods and containers failing to start"
    }
}
