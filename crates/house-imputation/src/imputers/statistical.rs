//! Statistical imputation methods.
//!
//! Provides mode fill for categorical columns and median fill for numeric
//! columns. Both are used directly by the random-missing step and as the
//! generic fallback for residual cells.

use crate::error::{ImputationError, Result};
use crate::types::{FillOutcome, FillValue};
use crate::utils::{column_median, column_series, numeric_values, replace_numeric, text_values};
use polars::prelude::*;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every missing cell of a categorical column with its mode.
    ///
    /// The mode is counted on the text form of the values, but the filled
    /// column keeps its dtype: a Boolean column stays Boolean.
    /// Returns `NoModeAvailable` when the column has no present value.
    pub fn fill_mode(df: &mut DataFrame, column: &str) -> Result<FillOutcome> {
        let labels = text_values(df, column)?;
        let row = Self::mode_row(&labels)
            .ok_or_else(|| ImputationError::NoModeAvailable(column.to_string()))?;
        let mode = labels[row].clone().unwrap_or_default();
        let value = FillValue::Label {
            value: mode.clone(),
        };

        let series = column_series(df, column)?;
        let missing = series.null_count();
        if missing == 0 {
            return Ok(FillOutcome::new(0, value));
        }

        let filler = series.new_from_index(row, series.len());
        let filled = series.zip_with(&series.is_not_null(), &filler)?;
        df.replace(column, filled)?;

        debug!("Filled {} cells of '{}' with mode '{}'", missing, column, mode);
        Ok(FillOutcome::new(missing, value))
    }

    /// Most frequent present value.
    ///
    /// Ties go to the value that occurs first in row order.
    pub fn mode_of(values: &[Option<String>]) -> Option<String> {
        Self::mode_row(values).and_then(|row| values[row].clone())
    }

    /// Row of the first occurrence of the most frequent present value.
    fn mode_row(values: &[Option<String>]) -> Option<usize> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (index, value) in values.iter().enumerate() {
            if let Some(value) = value {
                counts.entry(value.as_str()).or_insert((0, index)).0 += 1;
            }
        }

        counts
            .into_values()
            .max_by_key(|&(count, first)| (count, Reverse(first)))
            .map(|(_, first)| first)
    }

    /// Fill every missing cell of a numeric column with its table-wide median.
    ///
    /// Returns `NoValidValues` when the column has no present value.
    pub fn fill_median(df: &mut DataFrame, column: &str) -> Result<FillOutcome> {
        let median = column_median(df, column)?
            .ok_or_else(|| ImputationError::NoValidValues(column.to_string()))?;
        let mut values = numeric_values(df, column)?;
        let value = FillValue::Number { value: median };

        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            return Ok(FillOutcome::new(0, value));
        }

        for cell in values.iter_mut().filter(|v| v.is_none()) {
            *cell = Some(median);
        }
        replace_numeric(df, column, values)?;

        debug!("Filled {} cells of '{}' with median {:.2}", missing, column, median);
        Ok(FillOutcome::new(missing, value))
    }
}
