use super::ReportResult;
use crate::analysis::{AnalysisOutput, AnalysisStatus};
use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 40;

/// Terminal report generator for console output
pub struct TerminalReporter {
    anonymize: bool,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { anonymize: false }
    }

    pub fn with_anonymize(mut self, anonymize: bool) -> Self {
        self.anonymize = anonymize;
        self
    }

    pub fn print(&self, output: &AnalysisOutput) -> ReportResult<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(self.render(output).as_bytes())?;
        Ok(())
    }

    pub fn render(&self, output: &AnalysisOutput) -> String {
        let mut out = String::new();

        for name in &output.filters.unknown {
            let _ = writeln!(
                out,
                "{} filter {} does not match any analyzer",
                "Warning:".yellow().bold(),
                name.yellow()
            );
        }

        match output.status() {
            AnalysisStatus::NothingChecked => {
                let _ = writeln!(out, "{}", "No analyzers matched the active filters".yellow());
                return out;
            }
            AnalysisStatus::Ok => {
                let _ = writeln!(out, "{}", "No problems detected".green());
            }
            AnalysisStatus::Incomplete | AnalysisStatus::ProblemDetected => {}
        }

        for (index, result) in output.results.iter().enumerate() {
            let result = if self.anonymize {
                result.anonymized()
            } else {
                result.clone()
            };

            let _ = writeln!(out, "{}: {} {}", index, result.kind.cyan(), result.name.bold());
            for failure in &result.error {
                let _ = writeln!(out, "- {} {}", "Error:".red(), failure.text.red());
            }
        }

        if !output.errors.is_empty() {
            let _ = writeln!(out, "\n{}", "Analyzer errors".bright_white().bold());
            let _ = writeln!(out, "{}", "─".repeat(SEPARATOR_WIDTH).bright_black());
            for failure in &output.errors {
                let _ = writeln!(out, "- {}", failure.error.to_string().yellow());
            }
        }

        let _ = writeln!(
            out,
            "\nStatus: {} ({} problems in {} objects)",
            output.status().to_string().bold(),
            output.problems(),
            output.results.len()
        );
        out
    }
}
