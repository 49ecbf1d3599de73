//! Kubernetes cluster diagnostics.
//!
//! Analyzers list one kind of object, apply a fixed set of health rules and
//! report failing objects. Filters choose which analyzers run.

pub mod analysis;
pub mod analyzers;
pub mod cli;
pub mod client;
pub mod config;
pub mod filters;
pub mod mask;
pub mod metrics;
pub mod report;
