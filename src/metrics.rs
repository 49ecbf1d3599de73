//! Prometheus gauges recording how many failures each analyzer found per object.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `kubepilot_analyzer_errors` | Gauge | `analyzer_name`, `object_name`, `namespace` |
//!
//! The registry is process-wide. Every analyzer run first resets the series of
//! its own kind and then sets one series per failing object, so objects that
//! became healthy since the previous run do not keep reporting stale counts.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Label values of one series owned by an analyzer kind: (object name, namespace).
type SeriesKey = (String, String);

/// Analyzer failure gauges plus the bookkeeping needed to delete every series
/// of one kind.
pub struct AnalyzerMetrics {
    registry: Registry,
    analyzer_errors: GaugeVec,
    series: Mutex<HashMap<String, HashSet<SeriesKey>>>,
}

pub type SharedAnalyzerMetrics = Arc<AnalyzerMetrics>;

impl AnalyzerMetrics {
    /// Create metrics registered with a fresh registry.
    pub fn new() -> MetricsResult<Self> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> MetricsResult<Self> {
        let analyzer_errors = GaugeVec::new(
            Opts::new("analyzer_errors", "Number of failures detected by analyzer per object")
                .namespace("kubepilot"),
            &["analyzer_name", "object_name", "namespace"],
        )?;
        registry.register(Box::new(analyzer_errors.clone()))?;

        Ok(Self {
            registry,
            analyzer_errors,
            series: Mutex::new(HashMap::new()),
        })
    }

    /// The process-wide metrics instance, created on first use.
    pub fn global() -> SharedAnalyzerMetrics {
        static GLOBAL: OnceLock<SharedAnalyzerMetrics> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                // A fresh registry holds a single metric, so registration cannot collide.
                let metrics = AnalyzerMetrics::new()
                    .expect("registering analyzer metrics on an empty registry");
                Arc::new(metrics)
            })
            .clone()
    }

    fn tracked(&self) -> MutexGuard<'_, HashMap<String, HashSet<SeriesKey>>> {
        self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delete every series labelled with `kind`. Series of other kinds are untouched.
    pub fn reset(&self, kind: &str) {
        let mut tracked = self.tracked();
        if let Some(series) = tracked.remove(kind) {
            debug!("Resetting {} metric series for {}", series.len(), kind);
            for (name, namespace) in series {
                // Already-absent series are fine to skip.
                let _ = self
                    .analyzer_errors
                    .remove_label_values(&[kind, name.as_str(), namespace.as_str()]);
            }
        }
    }

    /// Set the failure count for one object.
    pub fn set(&self, kind: &str, name: &str, namespace: &str, failures: usize) {
        let mut tracked = self.tracked();
        self.analyzer_errors
            .with_label_values(&[kind, name, namespace])
            .set(failures as f64);

        tracked
            .entry(kind.to_string())
            .or_default()
            .insert((name.to_string(), namespace.to_string()));
    }

    /// Current value of a series, if the series exists.
    pub fn value(&self, kind: &str, name: &str, namespace: &str) -> Option<f64> {
        let tracked = self.tracked();
        let key = (name.to_string(), namespace.to_string());
        let exists = tracked.get(kind).is_some_and(|series| series.contains(&key));
        if !exists {
            return None;
        }
        Some(
            self.analyzer_errors
                .with_label_values(&[kind, name, namespace])
                .get(),
        )
    }

    /// Number of live series for a kind.
    pub fn series_count(&self, kind: &str) -> usize {
        self.tracked().get(kind).map_or(0, HashSet::len)
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}
