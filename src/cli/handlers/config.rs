use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn handle_config_command(config: &Config, config_path: &Path) -> Result<()> {
    println!("{}", "kubepilot configuration".bright_white().bold());
    println!("{}", "─".repeat(40).bright_black());
    println!();

    let status = if config_path.exists() {
        "loaded".green()
    } else {
        "not found, using defaults".yellow()
    };
    println!("  Config file:     {} ({})", config_path.display(), status);

    let filters = if config.active_filters.is_empty() {
        "core (default)".to_string()
    } else {
        config.active_filters.join(", ")
    };
    println!("  Active filters:  {}", filters.bright_cyan());

    let namespace = if config.namespace.is_empty() {
        "<all>"
    } else {
        config.namespace.as_str()
    };
    println!("  Namespace:       {}", namespace.bright_cyan());
    println!("  Max concurrency: {}", config.max_concurrency);
    println!("  Timeout:         {}s", config.timeout_secs);

    let kubeconfig = config
        .kubeconfig
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "inferred".to_string());
    println!("  Kubeconfig:      {}", kubeconfig);
    println!(
        "  Kube context:    {}",
        config.kubecontext.as_deref().unwrap_or("current")
    );

    println!();
    println!("{}", "YAML".bright_white().bold());
    println!("{}", serde_yaml::to_string(config)?);

    Ok(())
}
