//! Runtime layer.
//!
//! Sits between the caller-facing API (`analyze`, `analyze_food`) and the
//! provider interface (`generate`). It is responsible for:
//! - Building the content payload from the caller's input
//! - Selecting the JSON output strategy for the provider
//! - Driving the per-request lifecycle and classifying failures

pub mod analyzer;
pub mod state;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use state::AnalysisState;
