pub mod analyze;
pub mod config;
pub mod filters;

// Re-export handler functions for convenience
pub use analyze::{handle_analyze_command, AnalyzeOptions};
pub use config::handle_config_command;
pub use filters::handle_filters_command;
