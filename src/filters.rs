//! Filter names select which analyzers run.
//!
//! The catalog splits names into three disjoint groups: core filters run by
//! default, additional filters are opt-in and integration filters come from
//! analyzers registered at runtime.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterGroup {
    Core,
    Additional,
    Integration,
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FilterGroup::Core => "core",
            FilterGroup::Additional => "additional",
            FilterGroup::Integration => "integration",
        };
        f.write_str(label)
    }
}

/// Errors raised when editing the configured filter list
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter(s): {}", .0.join(", "))]
    Unknown(Vec<String>),

    #[error("filter(s) not active: {}", .0.join(", "))]
    NotActive(Vec<String>),
}

/// The three named filter sets known to a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCatalog {
    core: Vec<String>,
    additional: Vec<String>,
    integration: Vec<String>,
}

/// Outcome of resolving the configured filters against a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub active: Vec<String>,
    pub inactive: Vec<String>,
    /// Active names that no analyzer answers to
    pub unknown: Vec<String>,
}

impl FilterCatalog {
    pub fn new(core: Vec<String>, additional: Vec<String>, integration: Vec<String>) -> Self {
        Self {
            core,
            additional,
            integration,
        }
    }

    pub fn core(&self) -> &[String] {
        &self.core
    }

    pub fn additional(&self) -> &[String] {
        &self.additional
    }

    pub fn integration(&self) -> &[String] {
        &self.integration
    }

    /// Core, then additional, then integration names.
    pub fn available(&self) -> Vec<String> {
        self.core
            .iter()
            .chain(&self.additional)
            .chain(&self.integration)
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.group_of(name).is_some()
    }

    pub fn group_of(&self, name: &str) -> Option<FilterGroup> {
        let has = |names: &[String]| names.iter().any(|n| n == name);
        if has(&self.core) {
            Some(FilterGroup::Core)
        } else if has(&self.additional) {
            Some(FilterGroup::Additional)
        } else if has(&self.integration) {
            Some(FilterGroup::Integration)
        } else {
            None
        }
    }

    pub fn is_integration(&self, name: &str) -> bool {
        self.group_of(name) == Some(FilterGroup::Integration)
    }

    /// Resolve the user's configured filters. An empty list selects the core set.
    pub fn select(&self, configured: &[String]) -> FilterSelection {
        let active: Vec<String> = if configured.is_empty() {
            self.core.clone()
        } else {
            let mut active = Vec::with_capacity(configured.len());
            for name in configured {
                if !active.contains(name) {
                    active.push(name.clone());
                }
            }
            active
        };

        let inactive = self
            .available()
            .into_iter()
            .filter(|name| !active.contains(name))
            .collect();

        let unknown = active
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect();

        FilterSelection {
            active,
            inactive,
            unknown,
        }
    }

    /// Activate `names`, starting from the core set when nothing is configured yet.
    pub fn add(&self, configured: &[String], names: &[String]) -> Result<Vec<String>, FilterError> {
        let unknown: Vec<String> = names
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(FilterError::Unknown(unknown));
        }

        let mut active = self.select(configured).active;
        for name in names {
            if !active.contains(name) {
                active.push(name.clone());
            }
        }
        Ok(active)
    }

    /// Deactivate `names`. Every name must currently be active.
    pub fn remove(&self, configured: &[String], names: &[String]) -> Result<Vec<String>, FilterError> {
        let active = self.select(configured).active;
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !active.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(FilterError::NotActive(missing));
        }

        Ok(active.into_iter().filter(|name| !names.contains(name)).collect())
    }
}
