use crate::analyzers::{AnalysisResult, AnalyzerError, AnalyzerResult};
use crate::filters::FilterSelection;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// An analyzer that could not finish
#[derive(Debug)]
pub struct AnalyzerFailure {
    /// Filter name of the analyzer
    pub kind: String,
    pub error: AnalyzerError,
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    /// No active filter matched an analyzer
    NothingChecked,
    /// Analyzers ran and found nothing
    #[serde(rename = "OK")]
    Ok,
    /// Some analyzers failed and the rest found nothing
    Incomplete,
    ProblemDetected,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStatus::NothingChecked => "NothingChecked",
            AnalysisStatus::Ok => "OK",
            AnalysisStatus::Incomplete => "Incomplete",
            AnalysisStatus::ProblemDetected => "ProblemDetected",
        };
        f.write_str(label)
    }
}

/// Everything one run produced
#[derive(Debug)]
pub struct AnalysisOutput {
    pub results: Vec<AnalysisResult>,
    pub errors: Vec<AnalyzerFailure>,
    pub filters: FilterSelection,
    /// Filters that had an analyzer and were executed
    pub analyzed: Vec<String>,
}

impl AnalysisOutput {
    pub fn status(&self) -> AnalysisStatus {
        if self.analyzed.is_empty() {
            AnalysisStatus::NothingChecked
        } else if !self.results.is_empty() {
            AnalysisStatus::ProblemDetected
        } else if !self.errors.is_empty() {
            AnalysisStatus::Incomplete
        } else {
            AnalysisStatus::Ok
        }
    }

    /// Total number of failures across all results.
    pub fn problems(&self) -> usize {
        self.results.iter().map(|result| result.error.len()).sum()
    }
}

/// Collects analyzer outcomes for one run
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<AnalysisResult>,
    errors: Vec<AnalyzerFailure>,
    analyzed: Vec<String>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an analyzer's results, or record why it failed.
    pub fn merge(&mut self, filter: &str, outcome: AnalyzerResult<Vec<AnalysisResult>>) {
        self.analyzed.push(filter.to_string());
        match outcome {
            Ok(results) => {
                debug!("Analyzer {} produced {} results", filter, results.len());
                self.results.extend(results);
            }
            Err(error) => {
                warn!("Analyzer {} failed: {}", filter, error);
                self.errors.push(AnalyzerFailure {
                    kind: filter.to_string(),
                    error,
                });
            }
        }
    }

    pub fn finish(self, filters: FilterSelection) -> AnalysisOutput {
        AnalysisOutput {
            results: self.results,
            errors: self.errors,
            filters,
            analyzed: self.analyzed,
        }
    }
}
