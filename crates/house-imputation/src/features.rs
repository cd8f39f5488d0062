//! Derived features on the imputed table.

use crate::utils::{has_column, numeric_values};
use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// A column added by feature engineering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeature {
    pub name: String,
    pub sources: Vec<String>,
    pub formula: String,
}

/// Adds housing-specific derived columns.
pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Add HouseAge, TotalArea, HasPool and TotalBath where their inputs exist.
    ///
    /// A derived cell is missing when any of its inputs is missing.
    pub fn create_features(df: &mut DataFrame) -> Result<Vec<DerivedFeature>> {
        let mut created = Vec::new();

        if let Some(feature) = Self::derive(
            df,
            "HouseAge",
            &["YrSold", "YearBuilt"],
            "YrSold - YearBuilt",
            |v| v[0] - v[1],
        )? {
            created.push(feature);
        }

        if let Some(feature) = Self::derive(
            df,
            "TotalArea",
            &["TotalBsmtSF", "1stFlrSF", "2ndFlrSF", "GrLivArea"],
            "TotalBsmtSF + 1stFlrSF + 2ndFlrSF + GrLivArea",
            |v| v.iter().sum(),
        )? {
            created.push(feature);
        }

        if let Some(feature) = Self::derive(df, "HasPool", &["PoolArea"], "PoolArea > 0", |v| {
            if v[0] > 0.0 { 1.0 } else { 0.0 }
        })? {
            created.push(feature);
        }

        if let Some(feature) = Self::derive(
            df,
            "TotalBath",
            &["FullBath", "HalfBath", "BsmtFullBath", "BsmtHalfBath"],
            "FullBath + 0.5 * HalfBath + BsmtFullBath + 0.5 * BsmtHalfBath",
            |v| v[0] + 0.5 * v[1] + v[2] + 0.5 * v[3],
        )? {
            created.push(feature);
        }

        info!("Created {} derived features", created.len());
        Ok(created)
    }

    /// Add `log_<column>` = ln(1 + x) for each listed column.
    ///
    /// Absent columns are skipped silently; columns with any negative value
    /// are skipped with a warning.
    pub fn log_transform(df: &mut DataFrame, columns: &[String]) -> Result<Vec<DerivedFeature>> {
        let mut created = Vec::new();

        for column in columns {
            if !has_column(df, column) {
                continue;
            }
            let values = numeric_values(df, column)?;
            if values.iter().flatten().any(|v| *v < 0.0) {
                warn!("'{}' contains negative values, skipping log transform", column);
                continue;
            }

            let name = format!("log_{}", column);
            let logged: Vec<Option<f64>> = values.iter().map(|v| v.map(f64::ln_1p)).collect();
            df.with_column(Series::new(name.as_str().into(), logged))?;

            created.push(DerivedFeature {
                name,
                sources: vec![column.clone()],
                formula: format!("ln(1 + {})", column),
            });
        }

        Ok(created)
    }

    fn derive(
        df: &mut DataFrame,
        name: &str,
        sources: &[&str],
        formula: &str,
        compute: impl Fn(&[f64]) -> f64,
    ) -> Result<Option<DerivedFeature>> {
        if !sources.iter().all(|source| has_column(df, source)) {
            return Ok(None);
        }

        let inputs = sources
            .iter()
            .map(|source| numeric_values(df, source))
            .collect::<crate::error::Result<Vec<_>>>()?;

        let mut row = vec![0.0; sources.len()];
        let derived: Vec<Option<f64>> = (0..df.height())
            .map(|i| {
                for (slot, input) in row.iter_mut().zip(&inputs) {
                    *slot = input[i]?;
                }
                Some(compute(&row))
            })
            .collect();

        df.with_column(Series::new(name.into(), derived))?;
        Ok(Some(DerivedFeature {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            formula: formula.to_string(),
        }))
    }
}
