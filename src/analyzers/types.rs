use crate::mask::mask;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An identifier referenced by a failure text, in clear and masked form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensitive {
    pub unmasked: String,
    pub masked: String,
}

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        let unmasked = value.into();
        let masked = mask(&unmasked);
        Self { unmasked, masked }
    }
}

/// One rule violation found on an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub text: String,
    pub sensitive: Vec<Sensitive>,
}

impl Failure {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sensitive: Vec::new(),
        }
    }

    /// Record an identifier that appears in the text.
    pub fn with_sensitive(mut self, value: impl Into<String>) -> Self {
        self.sensitive.push(Sensitive::new(value));
        self
    }

    /// Failure text with every sensitive identifier replaced by its masked form.
    pub fn masked_text(&self) -> String {
        let mut pairs: Vec<&Sensitive> = self
            .sensitive
            .iter()
            .filter(|s| !s.unmasked.is_empty())
            .collect();
        // Longest first so "web" does not clobber part of "web-frontend".
        pairs.sort_by(|a, b| b.unmasked.len().cmp(&a.unmasked.len()));

        let mut text = self.text.clone();
        for pair in pairs {
            text = text.replace(&pair.unmasked, &pair.masked);
        }
        text
    }
}

/// All failures found on one object by one analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: String,
    /// `namespace/name` of the object
    pub name: String,
    pub error: Vec<Failure>,
}

impl AnalysisResult {
    /// Returns `None` when there is nothing to report.
    pub fn new(kind: impl Into<String>, name: impl Into<String>, failures: Vec<Failure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        Some(Self {
            kind: kind.into(),
            name: name.into(),
            error: failures,
        })
    }

    /// Copy of the result safe to show outside the cluster: the object name
    /// and failure texts are masked and clear values are blanked.
    pub fn anonymized(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            name: self.masked_name(),
            error: self
                .error
                .iter()
                .map(|failure| Failure {
                    text: failure.masked_text(),
                    sensitive: failure
                        .sensitive
                        .iter()
                        .map(|s| Sensitive {
                            unmasked: String::new(),
                            masked: s.masked.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// The object name with namespace and name masked.
    pub fn masked_name(&self) -> String {
        match self.name.split_once('/') {
            Some((namespace, name)) => format!("{}/{}", mask(namespace), mask(name)),
            None => mask(&self.name),
        }
    }
}

/// Identity key of a namespaced object.
pub fn object_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Failures collected per object while one analyzer runs.
///
/// Keeps objects in the order they were first recorded so results follow the
/// order of the listing call.
#[derive(Debug, Default)]
pub struct PreAnalysis {
    entries: Vec<PreAnalysisEntry>,
    /// (namespace, name) to position in `entries`
    index: HashMap<(String, String), usize>,
}

#[derive(Debug)]
struct PreAnalysisEntry {
    namespace: String,
    name: String,
    failures: Vec<Failure>,
}

impl PreAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add failures for an object. Empty failure lists are ignored.
    pub fn record(&mut self, namespace: &str, name: &str, failures: Vec<Failure>) {
        if failures.is_empty() {
            return;
        }
        let key = (namespace.to_string(), name.to_string());
        match self.index.get(&key) {
            Some(&position) => self.entries[position].failures.extend(failures),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(PreAnalysisEntry {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    failures,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(namespace, name, failure count)` for every recorded object.
    pub fn failure_counts(&self) -> impl Iterator<Item = (&str, &str, usize)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.namespace.as_str(), entry.name.as_str(), entry.failures.len()))
    }

    /// Fold into one result per object.
    pub fn into_results(self, kind: &str) -> Vec<AnalysisResult> {
        self.entries
            .into_iter()
            .filter_map(|entry| {
                let key = object_key(&entry.namespace, &entry.name);
                AnalysisResult::new(kind, key, entry.failures)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_pairs_mask() {
        let sensitive = Sensitive::new("ops");
        assert_eq!(sensitive.unmasked, "ops");
        assert_eq!(sensitive.masked, mask("ops"));
    }

    #[test]
    fn test_masked_text_replaces_identifiers() {
        let failure = Failure::new("CronJob backup is suspended")
            .with_sensitive("ops")
            .with_sensitive("backup");

        let masked = failure.masked_text();
        assert!(!masked.contains("backup"));
        assert!(masked.contains(&mask("backup")));
    }

    #[test]
    fn test_masked_text_prefers_longer_identifiers() {
        let failure = Failure::new("Pod web-frontend talks to web")
            .with_sensitive("web")
            .with_sensitive("web-frontend");

        let masked = failure.masked_text();
        assert!(masked.contains(&mask("web-frontend")));
        assert!(masked.ends_with(&mask("web")));
    }

    #[test]
    fn test_result_requires_failures() {
        assert!(AnalysisResult::new("Pod", "default/web", Vec::new()).is_none());

        let result = AnalysisResult::new("Pod", "default/web", vec![Failure::new("broken")]).unwrap();
        assert_eq!(result.error.len(), 1);
    }

    #[test]
    fn test_anonymized_hides_clear_values() {
        let failure = Failure::new("CronJob backup is suspended")
            .with_sensitive("ops")
            .with_sensitive("backup");
        let result = AnalysisResult::new("CronJob", "ops/backup", vec![failure]).unwrap();

        let anonymized = result.anonymized();
        assert_eq!(anonymized.name, result.masked_name());
        assert!(anonymized.error[0].sensitive.iter().all(|s| s.unmasked.is_empty()));
        assert_eq!(anonymized.error[0].sensitive[1].masked, mask("backup"));
        assert!(!anonymized.error[0].text.contains("backup"));
    }

    #[test]
    fn test_masked_name() {
        let result = AnalysisResult::new("CronJob", "ops/backup", vec![Failure::new("x")]).unwrap();
        assert_eq!(result.masked_name(), format!("{}/{}", mask("ops"), mask("backup")));
    }

    #[test]
    fn test_pre_analysis_keeps_insertion_order_and_merges() {
        let mut pre = PreAnalysis::new();
        pre.record("b", "two", vec![Failure::new("first")]);
        pre.record("a", "one", vec![Failure::new("second")]);
        pre.record("b", "two", vec![Failure::new("third")]);
        pre.record("c", "healthy", Vec::new());

        assert_eq!(pre.len(), 2);
        let counts: Vec<_> = pre.failure_counts().collect();
        assert_eq!(counts, vec![("b", "two", 2), ("a", "one", 1)]);

        let results = pre.into_results("CronJob");
        assert_eq!(results[0].name, "b/two");
        assert_eq!(results[0].error.len(), 2);
        assert_eq!(results[1].name, "a/one");
        assert!(results.iter().all(|r| r.kind == "CronJob"));
    }

    #[test]
    fn test_pre_analysis_large_listing() {
        let mut pre = PreAnalysis::new();
        for round in 0..2 {
            for i in 0..5_000 {
                pre.record("bulk", &format!("pod-{}", i), vec![Failure::new(format!("round {}", round))]);
            }
        }

        assert_eq!(pre.len(), 5_000);
        let results = pre.into_results("Pod");
        assert_eq!(results[0].name, "bulk/pod-0");
        assert_eq!(results[4_999].name, "bulk/pod-4999");
        assert!(results.iter().all(|r| r.error.len() == 2));
    }

    #[test]
    fn test_result_serializes_with_expected_fields() {
        let result = AnalysisResult::new("CronJob", "ops/backup", vec![Failure::new("x").with_sensitive("ops")]).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["kind"], "CronJob");
        assert_eq!(json["name"], "ops/backup");
        assert_eq!(json["error"][0]["text"], "x");
        assert_eq!(json["error"][0]["sensitive"][0]["unmasked"], "ops");
    }
}
