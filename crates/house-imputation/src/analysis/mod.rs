//! Post-imputation analysis.

mod correlation;

pub use correlation::{FeatureCorrelation, target_correlations};
