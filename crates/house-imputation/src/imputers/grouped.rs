//! Grouped median imputation for group-dependent columns.

use crate::error::{ImputationError, Result};
use crate::types::{FillOutcome, FillValue};
use crate::utils::{
    column_median, column_series, numeric_series, numeric_values, replace_numeric, text_values,
};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Fills a numeric column with the median of its group.
pub struct GroupedMedianImputer;

impl GroupedMedianImputer {
    /// Fill missing cells of `target` with the median of `target` within the
    /// row's `group_column` value.
    ///
    /// Group medians are computed once from the values present before the
    /// fill. A row whose group has no present values, or whose group key is
    /// itself missing, gets the table-wide median instead. If the target has
    /// no present values at all, `NoValidValues` is returned.
    pub fn fill(df: &mut DataFrame, target: &str, group_column: &str) -> Result<FillOutcome> {
        let mut values = numeric_values(df, target)?;
        let groups = text_values(df, group_column)?;

        let fallback = column_median(df, target)?;
        let medians = Self::group_medians(df, target, group_column)?;
        let value = FillValue::GroupMedians {
            group_column: group_column.to_string(),
            groups: medians.len(),
            fallback,
        };

        if values.iter().all(Option::is_some) {
            return Ok(FillOutcome::new(0, value));
        }
        let fallback = fallback.ok_or_else(|| ImputationError::NoValidValues(target.to_string()))?;

        let mut filled = 0;
        let mut used_fallback = 0;
        for (cell, key) in values.iter_mut().zip(&groups) {
            if cell.is_some() {
                continue;
            }
            let group_median = key.as_ref().and_then(|key| medians.get(key)).copied();
            if group_median.is_none() {
                used_fallback += 1;
            }
            *cell = Some(group_median.unwrap_or(fallback));
            filled += 1;
        }

        replace_numeric(df, target, values)?;
        debug!(
            "Filled {} cells of '{}' by {} median ({} from table-wide median {:.2})",
            filled, target, group_column, used_fallback, fallback
        );
        Ok(FillOutcome::new(filled, value))
    }

    /// Median of the present target values per group key. Groups with no
    /// present value, and rows with a missing key, are absent from the map.
    pub fn group_medians(
        df: &DataFrame,
        target: &str,
        group_column: &str,
    ) -> Result<HashMap<String, f64>> {
        let target_floats = numeric_series(df, target)?;
        let keys = column_series(df, group_column)?.cast(&DataType::String)?;
        let frame = DataFrame::new(vec![keys.into_column(), target_floats.into_column()])?;

        let medians = frame
            .lazy()
            .filter(col(group_column).is_not_null())
            .group_by([col(group_column)])
            .agg([col(target).median()])
            .collect()?;

        let keys = medians.column(group_column)?.str()?;
        let values = medians.column(target)?.f64()?;
        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, median)| Some((key?.to_string(), median?)))
            .collect())
    }
}
