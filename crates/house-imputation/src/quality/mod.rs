//! Data quality analysis module.
//!
//! This module provides missingness diagnostics, pruning of mostly-missing
//! columns and IQR outlier detection.

mod analyzer;
mod outliers;

pub use analyzer::{
    MissingColumnStats, MissingnessAnalyzer, MissingnessSnapshot, drop_high_missing_columns,
};
pub use outliers::{OutlierDetector, OutlierSummary};
