use super::ReportResult;
use crate::analysis::{AnalysisOutput, AnalysisStatus};
use crate::analyzers::AnalysisResult;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;

/// Machine-readable form of an analysis run
#[derive(Debug, Serialize)]
pub struct JsonReport {
    /// Explanation backend, empty when results are not explained
    pub provider: String,

    /// One message per analyzer that could not finish
    pub errors: Vec<String>,

    pub status: AnalysisStatus,

    /// Total failures across all results
    pub problems: usize,

    pub results: Vec<AnalysisResult>,

    pub generated_at: String,
}

impl JsonReport {
    pub fn from_output(output: &AnalysisOutput, anonymize: bool) -> Self {
        let results = if anonymize {
            output.results.iter().map(AnalysisResult::anonymized).collect()
        } else {
            output.results.clone()
        };

        Self {
            provider: String::new(),
            errors: output.errors.iter().map(|failure| failure.error.to_string()).collect(),
            status: output.status(),
            problems: output.problems(),
            results,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> ReportResult<()> {
        writeln!(writer, "{}", self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ResultAggregator;
    use crate::analyzers::{AnalyzerError, Failure};
    use crate::filters::FilterSelection;

    fn output() -> AnalysisOutput {
        let failure = Failure::new("CronJob backup has an invalid schedule: bad field")
            .with_sensitive("ops")
            .with_sensitive("backup");
        let mut aggregator = ResultAggregator::new();
        aggregator.merge(
            "CronJob",
            Ok(vec![AnalysisResult::new("CronJob", "ops/backup", vec![failure]).unwrap()]),
        );
        aggregator.merge("Pod", Err(AnalyzerError::Cancelled { kind: "Pod".to_string() }));
        aggregator.finish(FilterSelection {
            active: vec!["CronJob".to_string(), "Pod".to_string()],
            inactive: Vec::new(),
            unknown: Vec::new(),
        })
    }

    #[test]
    fn test_report_shape() {
        let report = JsonReport::from_output(&output(), false);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["provider"], "");
        assert_eq!(value["status"], "ProblemDetected");
        assert_eq!(value["problems"], 1);
        assert_eq!(value["errors"][0], "Pod analysis was cancelled");
        assert_eq!(value["results"][0]["kind"], "CronJob");
        assert_eq!(value["results"][0]["name"], "ops/backup");
        assert_eq!(
            value["results"][0]["error"][0]["text"],
            "CronJob backup has an invalid schedule: bad field"
        );
        assert!(chrono::DateTime::parse_from_rfc3339(value["generated_at"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_anonymized_report_hides_names() {
        let report = JsonReport::from_output(&output(), true);
        let text = &report.results[0].error[0].text;

        assert!(!text.contains("backup"));
        assert!(text.starts_with("CronJob "));
        assert!(text.ends_with("has an invalid schedule: bad field"));
    }

    #[test]
    fn test_anonymized_report_leaks_no_identifier() {
        let json = JsonReport::from_output(&output(), true).to_json().unwrap();

        assert!(!json.contains("backup"));
        assert!(!json.contains("ops/"));
        assert!(!json.contains("\"ops\""));
        assert!(json.contains(&crate::mask::mask("backup")));
    }

    #[test]
    fn test_ok_status_serialization() {
        let mut aggregator = ResultAggregator::new();
        aggregator.merge("Pod", Ok(Vec::new()));
        let output = aggregator.finish(FilterSelection {
            active: vec!["Pod".to_string()],
            inactive: Vec::new(),
            unknown: Vec::new(),
        });

        let mut buffer = Vec::new();
        JsonReport::from_output(&output, false).write_to(&mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["status"], "OK");
        assert_eq!(value["problems"], 0);
        assert!(value["results"].as_array().unwrap().is_empty());
    }
}
