pub mod aggregate;

pub use aggregate::{AnalysisOutput, AnalysisStatus, AnalyzerFailure, ResultAggregator};

use crate::analyzers::{AnalysisResult, AnalyzerError, AnalyzerRegistry, AnalyzerResult, ExecutionContext};
use crate::filters::FilterSelection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

type Outcome = (usize, String, AnalyzerResult<Vec<AnalysisResult>>);

/// One analysis run over the active filters
pub struct Analysis {
    registry: Arc<AnalyzerRegistry>,
    context: ExecutionContext,
    configured_filters: Vec<String>,
    max_concurrency: usize,
    timeout: Option<Duration>,
}

impl Analysis {
    pub fn new(registry: Arc<AnalyzerRegistry>, context: ExecutionContext) -> Self {
        Self {
            registry,
            context,
            configured_filters: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: None,
        }
    }

    /// Filters requested by the user. Empty selects the core set.
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.configured_filters = filters;
        self
    }

    /// Upper bound on analyzers running at once. One runs them sequentially.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Cancel in-flight listing calls once the run has taken this long.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn selection(&self) -> FilterSelection {
        self.registry.list_filters().select(&self.configured_filters)
    }

    pub async fn run(&self) -> AnalysisOutput {
        let selection = self.selection();
        for name in &selection.unknown {
            warn!("Filter {} does not match any analyzer", name);
        }

        info!(
            "Running {} analyzers in namespace {}",
            selection.active.len(),
            if self.context.namespace.is_empty() { "<all>" } else { self.context.namespace.as_str() }
        );

        // Each run gets its own token so a timeout does not outlive the run.
        let cancellation = self.context.cancellation.child_token();
        let run_context = self.context.clone().with_cancellation(cancellation.clone());

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Outcome> = JoinSet::new();
        let mut scheduled = Vec::new();

        for (index, name) in selection.active.iter().enumerate() {
            let Some(analyzer) = self.registry.get(name) else {
                continue;
            };
            scheduled.push((index, name.clone()));

            let ctx = run_context.clone();
            let semaphore = Arc::clone(&semaphore);
            let name = name.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await;
                debug!("Starting analyzer {}", name);
                let outcome = analyzer.analyze(&ctx).await;
                (index, name, outcome)
            });
        }

        let watchdog = self.timeout.map(|timeout| {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!("Analysis timed out after {:?}, cancelling", timeout);
                cancellation.cancel();
            })
        });

        let mut outcomes: Vec<Outcome> = Vec::with_capacity(scheduled.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Analyzer task failed to complete: {}", e),
            }
        }

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        // Tasks that panicked never reported back.
        for (index, name) in scheduled {
            if !outcomes.iter().any(|(i, _, _)| *i == index) {
                let error = AnalyzerError::Aborted {
                    kind: name.clone(),
                    message: "analyzer task panicked".to_string(),
                };
                outcomes.push((index, name, Err(error)));
            }
        }

        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut aggregator = ResultAggregator::new();
        for (_, name, outcome) in outcomes {
            aggregator.merge(&name, outcome);
        }
        let output = aggregator.finish(selection);

        info!(
            "Analysis finished: {} results, {} failed analyzers",
            output.results.len(),
            output.errors.len()
        );
        output
    }
}
