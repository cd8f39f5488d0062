//! Imputation module for handling missing values.
//!
//! This module provides the fillers the pipeline applies per column group:
//! - Constant sentinel fill (optionally conditional on a sibling column)
//! - Grouped median fill
//! - Statistical fill (mode, median)
//! - Nearest-neighbor estimation

mod constant;
mod grouped;
mod knn;
mod statistical;

pub use constant::ConstantImputer;
pub use grouped::GroupedMedianImputer;
pub use knn::NeighborEstimator;
pub use statistical::StatisticalImputer;
