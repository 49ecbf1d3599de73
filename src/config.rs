use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "KUBEPILOT_";

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Could not determine a config directory for this platform")]
    NoConfigDir,
}

/// Settings persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filters analyzed when none are given on the command line
    pub active_filters: Vec<String>,

    /// Namespace to analyze, empty for all namespaces
    pub namespace: String,

    pub max_concurrency: usize,

    /// Time budget for a whole analysis run
    pub timeout_secs: u64,

    pub kubeconfig: Option<PathBuf>,
    pub kubecontext: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_filters: Vec::new(),
            namespace: String::new(),
            max_concurrency: crate::analysis::DEFAULT_MAX_CONCURRENCY,
            timeout_secs: 60,
            kubeconfig: None,
            kubecontext: None,
        }
    }
}

impl Config {
    /// `<config dir>/kubepilot/kubepilot.yaml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("kubepilot").join("kubepilot.yaml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Read the file at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file, then apply `.env` and `KUBEPILOT_*` overrides.
    pub fn load_with_env(path: &Path) -> ConfigResult<Self> {
        let _ = dotenv::dotenv();
        let mut config = Self::load(path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `KUBEPILOT_*` environment variables.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Some(filters) = env_var("ACTIVE_FILTERS") {
            self.active_filters = filters
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(namespace) = env_var("NAMESPACE") {
            self.namespace = namespace;
        }

        if let Some(value) = env_var("MAX_CONCURRENCY") {
            self.max_concurrency = parse_env("MAX_CONCURRENCY", &value)?;
        }

        if let Some(value) = env_var("TIMEOUT_SECS") {
            self.timeout_secs = parse_env("TIMEOUT_SECS", &value)?;
        }

        if let Some(kubeconfig) = env_var("KUBECONFIG") {
            self.kubeconfig = Some(PathBuf::from(kubeconfig));
        }

        if let Some(context) = env_var("KUBECONTEXT") {
            self.kubecontext = Some(context);
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, key)).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: format!("{}{}", ENV_PREFIX, key),
        message: format!("'{}' is not a valid number", value),
    })
}
