use crate::analysis::{Analysis, AnalysisOutput};
use crate::analyzers::{AnalyzerRegistry, ExecutionContext};
use crate::cli::commands::OutputFormat;
use crate::client::{ClusterClient, InMemoryClusterClient, KubeClusterClient};
use crate::config::Config;
use crate::report::{JsonReport, TerminalReporter};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Flags of the `analyze` command
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub namespace: Option<String>,
    pub filters: Vec<String>,
    pub output: OutputFormat,
    pub anonymize: bool,
    pub manifests: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
    pub explain: bool,
}

pub async fn handle_analyze_command(options: AnalyzeOptions, config: Config) -> Result<()> {
    if options.explain {
        warn!("--explain is not available: no explanation backend is configured, printing raw results");
    }

    let client: Arc<dyn ClusterClient> = match &options.manifests {
        Some(path) => {
            let client = InMemoryClusterClient::from_manifest_file(path)
                .with_context(|| format!("Failed to load manifests from {}", path.display()))?;
            Arc::new(client)
        }
        None => {
            let client = KubeClusterClient::connect(
                config.kubeconfig.as_deref(),
                config.kubecontext.as_deref(),
            )
            .await
            .context("Failed to connect to the Kubernetes cluster")?;
            Arc::new(client)
        }
    };

    let spinner = (options.output == OutputFormat::Text).then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message("Analyzing cluster objects...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    });

    let output = run_analysis(&options, &config, client).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match options.output {
        OutputFormat::Text => TerminalReporter::new()
            .with_anonymize(options.anonymize)
            .print(&output)?,
        OutputFormat::Json => JsonReport::from_output(&output, options.anonymize).write_to(std::io::stdout())?,
    }

    Ok(())
}

/// Run the selected analyzers with flags taking precedence over the config file.
pub async fn run_analysis(
    options: &AnalyzeOptions,
    config: &Config,
    client: Arc<dyn ClusterClient>,
) -> AnalysisOutput {
    let namespace = options
        .namespace
        .clone()
        .unwrap_or_else(|| config.namespace.clone());
    let filters = if options.filters.is_empty() {
        config.active_filters.clone()
    } else {
        options.filters.clone()
    };
    let max_concurrency = options.max_concurrency.unwrap_or(config.max_concurrency);

    let context = ExecutionContext::new(client, namespace);
    Analysis::new(Arc::new(AnalyzerRegistry::with_builtin()), context)
        .with_filters(filters)
        .with_max_concurrency(max_concurrency)
        .with_timeout(config.timeout())
        .run()
        .await
}
