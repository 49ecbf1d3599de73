use super::commands::LogFormat;
use crate::config::{Config, ConfigResult};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the tracing subscriber. Logs go to stderr so stdout stays parseable.
pub fn init_logging(verbose: bool, log_format: LogFormat) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let fmt_layer = match log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

pub fn print_info() {
    println!("kubepilot v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("Authors: {}", env!("CARGO_PKG_AUTHORS"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!();
    println!("For more information, visit: {}", env!("CARGO_PKG_REPOSITORY"));
}

/// The `--config` path, or the platform default.
pub fn resolve_config_path(explicit: Option<&Path>) -> ConfigResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::default_path(),
    }
}

/// Effective configuration: file, then environment, then command-line flags.
pub fn load_config(
    config_path: &Path,
    kubeconfig: Option<PathBuf>,
    kubecontext: Option<String>,
) -> ConfigResult<Config> {
    let mut config = Config::load_with_env(config_path)?;
    if kubeconfig.is_some() {
        config.kubeconfig = kubeconfig;
    }
    if kubecontext.is_some() {
        config.kubecontext = kubecontext;
    }
    Ok(config)
}
