//! Pearson correlation of numeric columns with the target.

use crate::utils::{is_numeric_dtype, numeric_series};
use anyhow::{Context, Result};
use polars::lazy::dsl::pearson_corr;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Pearson correlation of one column with the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub correlation: f64,
    /// Rows where both the feature and the target are present.
    pub pairs: usize,
}

impl FeatureCorrelation {
    /// Verbal strength of the correlation.
    pub fn strength(&self) -> &'static str {
        match self.correlation.abs() {
            r if r > 0.7 => "very strong",
            r if r > 0.5 => "strong",
            r if r > 0.3 => "moderate",
            _ => "weak",
        }
    }
}

/// Correlate every other numeric column with `target`.
///
/// Pairs are taken over rows where both values are present. Columns with
/// fewer than two pairs or zero variance are omitted, as are the columns in
/// `exclude`. The result is sorted by absolute correlation, strongest first.
pub fn target_correlations(
    df: &DataFrame,
    target: &str,
    exclude: &[&str],
) -> Result<Vec<FeatureCorrelation>> {
    let target_floats = numeric_series(df, target)
        .with_context(|| format!("Target column '{}' is not usable", target))?;

    let mut correlations = Vec::new();
    for col in df.get_columns() {
        let name = col.name().as_str();
        if name == target || exclude.contains(&name) || !is_numeric_dtype(col.dtype()) {
            continue;
        }

        let feature = numeric_series(df, name)?.with_name("feature".into());
        let pair = DataFrame::new(vec![
            feature.into_column(),
            target_floats.clone().with_name("target".into()).into_column(),
        ])?;
        if let Some(correlation) = pairwise_pearson(pair)
            .with_context(|| format!("Failed to correlate '{}' with '{}'", name, target))?
        {
            correlations.push(FeatureCorrelation {
                feature: name.to_string(),
                ..correlation
            });
        }
    }

    correlations.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
    debug!("Computed {} correlations with '{}'", correlations.len(), target);
    Ok(correlations)
}

/// Correlation of the `feature` and `target` columns over their complete rows.
fn pairwise_pearson(pair: DataFrame) -> Result<Option<FeatureCorrelation>> {
    let stats = pair
        .lazy()
        .filter(col("feature").is_not_null().and(col("target").is_not_null()))
        .select([
            len().cast(DataType::UInt64).alias("pairs"),
            pearson_corr(col("feature"), col("target")).alias("r"),
        ])
        .collect()?;

    let pairs = stats.column("pairs")?.u64()?.get(0).unwrap_or(0) as usize;
    let correlation = stats.column("r")?.f64()?.get(0);
    Ok(match correlation {
        Some(correlation) if pairs >= 2 && correlation.is_finite() => Some(FeatureCorrelation {
            feature: String::new(),
            correlation,
            pairs,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlation_of(df: &DataFrame, feature: &str) -> Option<f64> {
        target_correlations(df, "SalePrice", &[])
            .unwrap()
            .into_iter()
            .find(|c| c.feature == feature)
            .map(|c| c.correlation)
    }

    #[test]
    fn test_perfect_linear_relation() {
        let df = df![
            "Up" => [1.0, 2.0, 3.0],
            "Down" => [3i64, 2, 1],
            "SalePrice" => [2.0, 4.0, 6.0],
        ]
        .unwrap();

        assert!((correlation_of(&df, "Up").unwrap() - 1.0).abs() < 1e-12);
        assert!((correlation_of(&df, "Down").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_columns_omitted() {
        let df = df![
            "Single" => [Some(1.0), None, None],
            "Flat" => [Some(1.0), Some(1.0), Some(1.0)],
            "SalePrice" => [1.0, 2.0, 3.0],
        ]
        .unwrap();

        assert_eq!(correlation_of(&df, "Single"), None);
        assert_eq!(correlation_of(&df, "Flat"), None);
    }

    #[test]
    fn test_excluded_columns_skipped() {
        let df = df![
            "GrLivArea" => [1.0, 2.0, 4.0],
            "log_SalePrice" => [2.4, 3.0, 3.4],
            "SalePrice" => [10.0, 20.0, 30.0],
        ]
        .unwrap();

        let correlations = target_correlations(&df, "SalePrice", &["log_SalePrice"]).unwrap();
        let names: Vec<&str> = correlations.iter().map(|c| c.feature.as_str()).collect();
        assert_eq!(names, vec!["GrLivArea"]);
    }

    #[test]
    fn test_target_correlations_sorted_by_strength() {
        let df = df![
            "GrLivArea" => [1.0, 2.0, 3.0, 4.0],
            "Noise" => [1.0, -1.0, -1.0, 1.0],
            "Age" => [4.0, 3.0, 1.0, 1.0],
            "Constant" => [7.0, 7.0, 7.0, 7.0],
            "Street" => ["Pave", "Pave", "Grvl", "Pave"],
            "SalePrice" => [10.0, 20.0, 30.0, 40.0],
        ]
        .unwrap();

        let correlations = target_correlations(&df, "SalePrice", &[]).unwrap();
        let names: Vec<&str> = correlations.iter().map(|c| c.feature.as_str()).collect();

        assert_eq!(names, vec!["GrLivArea", "Age", "Noise"]);
        assert!(correlations[1].correlation < 0.0);
        assert_eq!(correlations[0].strength(), "very strong");
        assert_eq!(correlations[2].strength(), "weak");
        assert_eq!(correlations[0].pairs, 4);
    }

    #[test]
    fn test_pairwise_complete_rows() {
        let df = df![
            "x" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "SalePrice" => [Some(1.0), Some(2.0), None, Some(4.0)],
        ]
        .unwrap();

        let correlations = target_correlations(&df, "SalePrice", &[]).unwrap();
        assert_eq!(correlations[0].pairs, 2);
    }
}
