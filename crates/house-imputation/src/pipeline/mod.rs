//! Pipeline module.
//!
//! This module provides the ordered imputation pipeline and the full analysis
//! pipeline that wraps it.

mod builder;
mod executor;
pub mod progress;
mod steps;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use executor::{ImputationOutcome, ImputationPipeline};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
pub use steps::{ImputationStep, validate_order};
