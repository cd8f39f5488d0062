//! Housing Data Imputation Library
//!
//! Missingness analysis and mechanism-aware imputation for residential sale
//! records, built with Rust and Polars.
//!
//! # Overview
//!
//! Every column with missing cells is assigned a missingness mechanism from a
//! declarative schema table, and each mechanism maps to a filler:
//!
//! - **Structural absence**: the attribute does not apply (no pool, no
//!   basement), filled with a `"None"` label or `0`
//! - **Group dependent**: filled with the median of a grouping column
//!   (`LotFrontage` by `Neighborhood`)
//! - **Random missing**: filled with the mode, or estimated from the nearest
//!   neighbors in a standardized feature space
//! - **Unclassified**: a generic median or mode fallback
//!
//! The fillers run as an ordered [`ImputationPipeline`]. A run either returns
//! a table with no missing cells plus an [`ImputationReport`], or an error.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use house_imputation::ImputationPipeline;
//!
//! let outcome = ImputationPipeline::default().run(&df)?;
//! println!("Filled {} cells", outcome.report.cells_filled());
//! ```
//!
//! # Full Analysis
//!
//! [`Pipeline`] wraps the imputation with missingness diagnostics, optional
//! column pruning, derived features, correlation with the target and report
//! files:
//!
//! ```rust,ignore
//! use house_imputation::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .drop_missing_threshold(0.8)
//!     .output_dir("output")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("Resolution rate: {:.1}%", result.imputation.resolution_rate());
//! ```

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analysis::{FeatureCorrelation, target_correlations};
pub use classifier::{Classification, ColumnSpec, FillRule, MechanismClassifier, Sentinel};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{ImputationError, Result, ResultExt};
pub use features::{DerivedFeature, FeatureEngineer};
pub use imputers::{ConstantImputer, GroupedMedianImputer, NeighborEstimator, StatisticalImputer};
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, ImputationOutcome, ImputationPipeline, ImputationStep,
    Pipeline, PipelineBuilder, PipelineResult, ProgressReporter, ProgressUpdate,
};
pub use quality::{MissingColumnStats, MissingnessAnalyzer, MissingnessSnapshot, OutlierDetector};
pub use reporting::{AnalysisReport, ImputationReport, ReportGenerator};
pub use types::{
    ColumnImputationRecord, ColumnImputationSummary, ColumnKind, FillOutcome, FillValue, FillerKind, MechanismTag,
};
