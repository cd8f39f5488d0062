//! Shared utilities for the imputation pipeline.
//!
//! Typed column access lives here so that every filler reads and writes the
//! table the same way: numeric columns as `Vec<Option<f64>>`, categorical
//! columns as `Vec<Option<String>>`, nulls as `None`.

use crate::error::{ImputationError, Result};
use crate::types::ColumnKind;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::path::Path;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Kind of a column as stored in the table.
pub fn column_kind(series: &Series) -> ColumnKind {
    if is_numeric_dtype(series.dtype()) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Names of the columns of a DataFrame, in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Check whether a column exists.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Total number of null cells across all columns.
pub fn total_missing(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

/// Read a CSV file with a header row. The literal `NA` is read as missing.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_quote_char(Some(b'"'))
        .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())));

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

// =============================================================================
// Typed Column Access
// =============================================================================

/// Borrow a column as a Series, or signal `ColumnNotFound`.
pub fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| ImputationError::ColumnNotFound(name.to_string()))
}

/// Number of missing cells in a column.
pub fn missing_count(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(column_series(df, name)?.null_count())
}

/// A numeric column cast to Float64.
///
/// An all-null column of any dtype is accepted; a non-numeric column holding
/// values is a `TypeMismatch`.
pub fn numeric_series(df: &DataFrame, name: &str) -> Result<Series> {
    let series = column_series(df, name)?;
    if !is_numeric_dtype(series.dtype()) && series.null_count() != series.len() {
        return Err(ImputationError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
        });
    }
    Ok(series.cast(&DataType::Float64)?)
}

/// Read a numeric column.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let floats = numeric_series(df, name)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Read a column as text labels. Non-string columns are cast.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column_series(df, name)?;
    let strings = series.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Replace a column with numeric values (stored as Float64).
pub fn replace_numeric(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    df.replace(name, Series::new(name.into(), values))?;
    Ok(())
}

/// Replace a column with text values (stored as String).
pub fn replace_text(df: &mut DataFrame, name: &str, values: Vec<Option<String>>) -> Result<()> {
    df.replace(name, Series::new(name.into(), values))?;
    Ok(())
}

// =============================================================================
// Statistics
// =============================================================================

/// Median of the present values of a numeric column, with the even-count
/// midpoint average. `None` when nothing is present.
pub fn column_median(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    let floats = numeric_series(df, name)?;
    Ok(floats.f64()?.median())
}

/// Linearly interpolated quantile of the present values of a numeric column.
pub fn column_quantile(df: &DataFrame, name: &str, q: f64) -> Result<Option<f64>> {
    let floats = numeric_series(df, name)?;
    Ok(floats.f64()?.quantile(q, QuantileMethod::Linear)?)
}

// =============================================================================
// Tests
// =============================================================================
