use crate::analyzers::AnalyzerRegistry;
use crate::cli::commands::FiltersCommand;
use crate::config::Config;
use crate::report::print_filter_listing;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::info;

pub fn handle_filters_command(action: FiltersCommand, config: Config, config_path: &Path) -> Result<()> {
    let registry = AnalyzerRegistry::with_builtin();

    match action {
        FiltersCommand::List => {
            let catalog = registry.list_filters();
            let selection = catalog.select(&config.active_filters);
            print_filter_listing(&catalog, &selection);
        }
        FiltersCommand::Add { names } => {
            let config = add_filters(&registry, &names, config_path)?;
            println!("{} {}", "Filter(s) added:".green(), names.join(", "));
            info!("Active filters: {}", config.active_filters.join(", "));
        }
        FiltersCommand::Remove { names } => {
            let config = remove_filters(&registry, &names, config_path)?;
            println!("{} {}", "Filter(s) removed:".green(), names.join(", "));
            info!("Active filters: {}", config.active_filters.join(", "));
        }
    }

    Ok(())
}

/// Activate `names` in the config file.
///
/// Only `active_filters` is rewritten. Environment and flag overrides in the
/// effective config never reach the file.
pub fn add_filters(registry: &AnalyzerRegistry, names: &[String], config_path: &Path) -> Result<Config> {
    let mut stored = Config::load(config_path)?;
    stored.active_filters = registry.list_filters().add(&stored.active_filters, names)?;
    stored.save(config_path)?;
    Ok(stored)
}

/// Deactivate `names` in the config file.
pub fn remove_filters(registry: &AnalyzerRegistry, names: &[String], config_path: &Path) -> Result<Config> {
    let mut stored = Config::load(config_path)?;
    stored.active_filters = registry.list_filters().remove(&stored.active_filters, names)?;
    stored.save(config_path)?;
    Ok(stored)
}
