use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kubepilot",
    about = "Kubernetes cluster health diagnostics with pluggable analyzers",
    version,
    author
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Config file (default: <config dir>/kubepilot/kubepilot.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Kubeconfig file used to reach the cluster
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub kubecontext: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze cluster objects for problems
    Analyze {
        /// Namespace to analyze (default: all namespaces)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Filter to run, may be repeated (default: configured filters)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Mask object names in the output
        #[arg(short, long)]
        anonymize: bool,

        /// Analyze objects from a YAML manifest file instead of a live cluster
        #[arg(long)]
        manifests: Option<PathBuf>,

        /// Maximum number of analyzers running at once
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Ask an AI backend to explain the results
        #[arg(short, long)]
        explain: bool,
    },

    /// Manage the active filters
    Filters {
        #[command(subcommand)]
        action: FiltersCommand,
    },

    /// Display current kubepilot configuration
    Config,

    /// Show information about kubepilot
    Info,
}

#[derive(Subcommand, Debug)]
pub enum FiltersCommand {
    /// List active and unused filters
    List,

    /// Activate filters
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Deactivate filters
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
