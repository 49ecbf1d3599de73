use anyhow::Result;
use clap::Parser;
use kubepilot::cli::commands::{Cli, Commands};
use kubepilot::cli::handlers::{
    handle_analyze_command, handle_config_command, handle_filters_command, AnalyzeOptions,
};
use kubepilot::cli::utils::{init_logging, load_config, print_info, resolve_config_path};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    if let Commands::Info = cli.command {
        print_info();
        return Ok(());
    }

    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = load_config(&config_path, cli.kubeconfig, cli.kubecontext)?;

    match cli.command {
        Commands::Analyze {
            namespace,
            filters,
            output,
            anonymize,
            manifests,
            max_concurrency,
            explain,
        } => {
            let options = AnalyzeOptions {
                namespace,
                filters,
                output,
                anonymize,
                manifests,
                max_concurrency,
                explain,
            };
            handle_analyze_command(options, config).await
        }

        Commands::Filters { action } => handle_filters_command(action, config, &config_path),

        Commands::Config => handle_config_command(&config, &config_path),

        Commands::Info => Ok(()),
    }
}
