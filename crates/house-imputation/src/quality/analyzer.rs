//! Missingness snapshot of a table and high-missing column pruning.

use crate::error::Result;
use crate::utils::column_kind;
use crate::types::ColumnKind;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Missing-value statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingColumnStats {
    pub column: String,
    pub kind: ColumnKind,
    pub missing: usize,
    /// Percentage of rows missing (0-100).
    pub percentage: f64,
}

/// Read-only summary of missingness in a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingnessSnapshot {
    pub rows: usize,
    pub columns: usize,
    pub total_missing: usize,
    /// Columns with at least one missing cell, by percentage descending.
    /// Equal percentages keep table order.
    pub missing_columns: Vec<MissingColumnStats>,
}

impl MissingnessSnapshot {
    /// The `n` columns with the highest missing percentage.
    pub fn top(&self, n: usize) -> &[MissingColumnStats] {
        &self.missing_columns[..n.min(self.missing_columns.len())]
    }

    /// Columns whose missing fraction is strictly above `fraction`.
    pub fn columns_above(&self, fraction: f64) -> Vec<&str> {
        self.missing_columns
            .iter()
            .filter(|stats| stats.percentage / 100.0 > fraction)
            .map(|stats| stats.column.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.total_missing == 0
    }

    /// Share of all cells that are missing (0-100).
    pub fn overall_percentage(&self) -> f64 {
        let cells = self.rows * self.columns;
        if cells == 0 {
            0.0
        } else {
            self.total_missing as f64 / cells as f64 * 100.0
        }
    }
}

/// Computes missingness statistics without touching the table.
pub struct MissingnessAnalyzer;

impl MissingnessAnalyzer {
    pub fn analyze(df: &DataFrame) -> MissingnessSnapshot {
        let rows = df.height();
        let mut missing_columns: Vec<MissingColumnStats> = df
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| {
                let missing = col.null_count();
                MissingColumnStats {
                    column: col.name().to_string(),
                    kind: column_kind(col.as_materialized_series()),
                    missing,
                    percentage: missing as f64 / rows as f64 * 100.0,
                }
            })
            .collect();

        // stable sort keeps table order on ties
        missing_columns.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        let snapshot = MissingnessSnapshot {
            rows,
            columns: df.width(),
            total_missing: missing_columns.iter().map(|s| s.missing).sum(),
            missing_columns,
        };
        debug!(
            "Missingness: {} cells across {} columns",
            snapshot.total_missing,
            snapshot.missing_columns.len()
        );
        snapshot
    }
}

/// Drop columns whose missing fraction is strictly above `threshold`.
///
/// The `protected` column is never dropped. Returns the dropped names in
/// table order.
pub fn drop_high_missing_columns(
    df: &mut DataFrame,
    threshold: f64,
    protected: &str,
) -> Result<Vec<String>> {
    let rows = df.height();
    if rows == 0 {
        return Ok(Vec::new());
    }

    let to_drop: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.name().as_str() != protected)
        .filter(|col| col.null_count() as f64 / rows as f64 > threshold)
        .map(|col| col.name().to_string())
        .collect();

    for name in &to_drop {
        df.drop_in_place(name)?;
    }

    if !to_drop.is_empty() {
        info!(
            "Dropped {} columns above {:.0}% missing: {:?}",
            to_drop.len(),
            threshold * 100.0,
            to_drop
        );
    }
    Ok(to_drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "Id" => [1i64, 2, 3, 4],
            "Alley" => [None, None, None, Some("Grvl")],
            "PoolQC" => [Option::<&str>::None, None, None, None],
            "LotFrontage" => [Some(60.0), None, Some(70.0), Some(80.0)],
            "Fence" => [Some("MnPrv"), None, Some("GdWo"), Some("MnPrv")],
            "SalePrice" => [Some(100.0), None, None, None],
        ]
        .unwrap()
    }

    #[test]
    fn test_snapshot_sorted_descending_with_stable_ties() {
        let snapshot = MissingnessAnalyzer::analyze(&sample());

        let order: Vec<&str> = snapshot
            .missing_columns
            .iter()
            .map(|s| s.column.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["PoolQC", "Alley", "SalePrice", "LotFrontage", "Fence"]
        );
        assert_eq!(snapshot.total_missing, 12);
        assert_eq!(snapshot.rows, 4);
        assert_eq!(snapshot.columns, 6);
        assert_eq!(snapshot.missing_columns[0].percentage, 100.0);
        assert_eq!(snapshot.missing_columns[3].kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_top_and_threshold() {
        let snapshot = MissingnessAnalyzer::analyze(&sample());
        assert_eq!(snapshot.top(2).len(), 2);
        assert_eq!(snapshot.top(100).len(), 5);
        assert_eq!(snapshot.columns_above(0.75), vec!["PoolQC"]);
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn test_complete_table() {
        let df = df!["a" => [1.0, 2.0]].unwrap();
        let snapshot = MissingnessAnalyzer::analyze(&df);
        assert!(snapshot.is_complete());
        assert!(snapshot.missing_columns.is_empty());
        assert_eq!(snapshot.overall_percentage(), 0.0);
    }

    #[test]
    fn test_drop_high_missing_protects_target() {
        let mut df = sample();
        let dropped = drop_high_missing_columns(&mut df, 0.7, "SalePrice").unwrap();

        assert_eq!(dropped, vec!["Alley", "PoolQC"]);
        assert!(df.column("SalePrice").is_ok());
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn test_drop_threshold_is_exclusive() {
        let mut df = sample();
        let dropped = drop_high_missing_columns(&mut df, 0.75, "SalePrice").unwrap();
        assert_eq!(dropped, vec!["PoolQC"]);
    }
}
