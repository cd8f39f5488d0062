//! Outlier detection for numeric columns.
//!
//! Uses the interquartile range rule: values below Q1 - 1.5 * IQR or above
//! Q3 + 1.5 * IQR are outliers. Quartiles are linearly interpolated.

use crate::error::Result;
use crate::utils::{column_quantile, numeric_values};
use polars::prelude::*;
use serde::Serialize;

/// IQR outlier statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Rows outside the bounds.
    pub outliers: usize,
    pub outlier_percentage: f64,
}

/// Detects outliers with the IQR rule.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Summarize outliers in a numeric column. `None` when the column has no
    /// present values.
    pub fn detect(df: &DataFrame, column: &str) -> Result<Option<OutlierSummary>> {
        let (Some(q1), Some(q3)) = (
            column_quantile(df, column, 0.25)?,
            column_quantile(df, column, 0.75)?,
        ) else {
            return Ok(None);
        };
        let present: Vec<f64> = numeric_values(df, column)?.into_iter().flatten().collect();

        let iqr = q3 - q1;
        let lower_bound = q1 - 1.5 * iqr;
        let upper_bound = q3 + 1.5 * iqr;
        let outliers = present
            .iter()
            .filter(|&&v| v < lower_bound || v > upper_bound)
            .count();

        Ok(Some(OutlierSummary {
            column: column.to_string(),
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
            outliers,
            outlier_percentage: outliers as f64 / present.len() as f64 * 100.0,
        }))
    }
}
