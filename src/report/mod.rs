pub mod filters;
pub mod json;
pub mod terminal;

pub use filters::print_filter_listing;
pub use json::JsonReport;
pub use terminal::TerminalReporter;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur during report generation
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
