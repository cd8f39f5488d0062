//! Nearest-neighbor estimation for random-missing numeric columns.

use crate::error::{ImputationError, Result};
use crate::types::{FillOutcome, FillValue};
use crate::utils::{numeric_series, numeric_values, replace_numeric};
use polars::prelude::*;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};

/// Estimates missing numeric cells from the k most similar rows.
///
/// Similarity is squared Euclidean distance over z-scored feature columns.
/// The estimate is the unweighted mean of the target at the k nearest rows
/// among those where the target is present.
pub struct NeighborEstimator {
    n_neighbors: usize,
}

/// Candidate row in the bounded max-heap. Ordered by distance, then row index,
/// so the heap top is the worst of the current k and ties favor lower rows.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    distance: f64,
    row: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.row.cmp(&other.row))
    }
}

impl NeighborEstimator {
    /// Create a new estimator with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Fill the missing cells of each target column.
    ///
    /// Every feature column must be complete; an incomplete one means an
    /// earlier step has not run and yields `PipelineOrderingViolation`.
    /// Observed target values are never changed. A target with no present
    /// value is left as is for the fallback step.
    pub fn fill(
        &self,
        df: &mut DataFrame,
        targets: &[&str],
        features: &[&str],
    ) -> Result<Vec<(String, FillOutcome)>> {
        let matrix = self.feature_matrix(df, features)?;
        let mut outcomes = Vec::with_capacity(targets.len());

        for &target in targets {
            let mut values = numeric_values(df, target)?;
            let missing_rows: Vec<usize> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_none())
                .map(|(row, _)| row)
                .collect();
            let candidates: Vec<usize> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_some())
                .map(|(row, _)| row)
                .collect();

            let k = self.n_neighbors.min(candidates.len());
            let value = FillValue::NeighborMean {
                k,
                features: features.len(),
            };

            if missing_rows.is_empty() {
                outcomes.push((target.to_string(), FillOutcome::new(0, value)));
                continue;
            }
            if candidates.is_empty() {
                warn!(
                    "No present values in '{}', leaving {} cells for fallback",
                    target,
                    missing_rows.len()
                );
                outcomes.push((target.to_string(), FillOutcome::unchanged()));
                continue;
            }

            let estimates: Vec<(usize, f64)> = missing_rows
                .par_iter()
                .map(|&row| {
                    let nearest = self.nearest(&matrix, row, &candidates);
                    let sum: f64 = nearest.iter().filter_map(|n| values[n.row]).sum();
                    (row, sum / nearest.len() as f64)
                })
                .collect();

            for &(row, estimate) in &estimates {
                values[row] = Some(estimate);
            }
            replace_numeric(df, target, values)?;

            debug!(
                "Estimated {} cells of '{}' from {} nearest rows",
                estimates.len(),
                target,
                k
            );
            outcomes.push((target.to_string(), FillOutcome::new(estimates.len(), value)));
        }

        Ok(outcomes)
    }

    /// Row-major matrix of z-scored feature values.
    fn feature_matrix(&self, df: &DataFrame, features: &[&str]) -> Result<Vec<Vec<f64>>> {
        let mut matrix = vec![Vec::with_capacity(features.len()); df.height()];

        for &feature in features {
            let floats = numeric_series(df, feature)?;
            let column = floats.f64()?;
            if column.null_count() > 0 {
                return Err(ImputationError::PipelineOrderingViolation(format!(
                    "feature column '{}' still has {} missing cells",
                    feature,
                    column.null_count()
                )));
            }

            // population moments
            let mean = column.mean().unwrap_or(0.0);
            let std = column.std(0).unwrap_or(0.0);
            let scale = if std > 0.0 { std } else { 1.0 };
            for (row, value) in matrix.iter_mut().zip(column.into_no_null_iter()) {
                row.push((value - mean) / scale);
            }
        }

        Ok(matrix)
    }

    /// The k candidates closest to `row`, nearest first.
    fn nearest(&self, matrix: &[Vec<f64>], row: usize, candidates: &[usize]) -> Vec<Neighbor> {
        let mut heap = BinaryHeap::with_capacity(self.n_neighbors + 1);
        for &candidate in candidates {
            let neighbor = Neighbor {
                distance: Self::squared_distance(&matrix[row], &matrix[candidate]),
                row: candidate,
            };
            if heap.len() < self.n_neighbors {
                heap.push(neighbor);
            } else if heap.peek().is_some_and(|worst| neighbor < *worst) {
                heap.pop();
                heap.push(neighbor);
            }
        }
        heap.into_sorted_vec()
    }

    fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // NeighborEstimator::new() tests
    // ========================================================================

    #[test]
    fn test_new_with_zero_neighbors_defaults_to_one() {
        assert_eq!(NeighborEstimator::new(0).n_neighbors(), 1);
        assert_eq!(NeighborEstimator::new(5).n_neighbors(), 5);
    }

    // ========================================================================
    // fill() tests
    // ========================================================================

    #[test]
    fn test_estimate_is_mean_of_k_nearest() {
        let estimator = NeighborEstimator::new(2);
        let mut df = df![
            "x" => [0.0, 1.0, 2.0, 3.0, 10.0],
            "target" => [None, Some(10.0), Some(20.0), Some(30.0), Some(1000.0)],
        ]
        .unwrap();

        let outcomes = estimator.fill(&mut df, &["target"], &["x"]).unwrap();

        assert_eq!(outcomes[0].1.filled, 1);
        assert_eq!(numeric_values(&df, "target").unwrap()[0], Some(15.0));
    }

    #[test]
    fn test_k_clamped_to_available_rows() {
        let estimator = NeighborEstimator::new(10);
        let mut df = df![
            "x" => [1.0, 2.0, 3.0],
            "target" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();

        let outcomes = estimator.fill(&mut df, &["target"], &["x"]).unwrap();

        assert_eq!(
            outcomes[0].1.value,
            FillValue::NeighborMean { k: 2, features: 1 }
        );
        assert_eq!(numeric_values(&df, "target").unwrap()[1], Some(20.0));
    }

    #[test]
    fn test_distance_ties_favor_lower_row() {
        let estimator = NeighborEstimator::new(1);
        let mut df = df![
            "x" => [0.0, 1.0, -1.0, 5.0],
            "target" => [None, Some(10.0), Some(20.0), Some(30.0)],
        ]
        .unwrap();

        estimator.fill(&mut df, &["target"], &["x"]).unwrap();
        assert_eq!(numeric_values(&df, "target").unwrap()[0], Some(10.0));
    }

    #[test]
    fn test_features_are_standardized() {
        // unscaled, "big" would dominate and row 2 would win
        let estimator = NeighborEstimator::new(1);
        let mut df = df![
            "small" => [0.0, 0.0, 1.0, 1.0],
            "big" => [0.0, 50.0, 0.0, 1000.0],
            "target" => [None, Some(1.0), Some(2.0), Some(3.0)],
        ]
        .unwrap();

        estimator.fill(&mut df, &["target"], &["small", "big"]).unwrap();
        let estimate = numeric_values(&df, "target").unwrap()[0];
        assert_eq!(estimate, Some(1.0));
    }

    #[test]
    fn test_observed_values_untouched() {
        let estimator = NeighborEstimator::new(2);
        let mut df = df![
            "x" => [1i64, 2, 3, 4],
            "target" => [Some(10i64), None, Some(30), None],
        ]
        .unwrap();

        estimator.fill(&mut df, &["target"], &["x"]).unwrap();
        let values = numeric_values(&df, "target").unwrap();
        assert_eq!(values[0], Some(10.0));
        assert_eq!(values[2], Some(30.0));
        assert_eq!(df.column("target").unwrap().null_count(), 0);
    }

    #[test]
    fn test_incomplete_feature_is_ordering_violation() {
        let estimator = NeighborEstimator::new(2);
        let mut df = df![
            "x" => [Some(1.0), None, Some(3.0)],
            "target" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();

        let err = estimator.fill(&mut df, &["target"], &["x"]).unwrap_err();
        assert_eq!(err.error_code(), "PIPELINE_ORDERING_VIOLATION");
        assert_eq!(numeric_values(&df, "target").unwrap()[1], None);
    }

    #[test]
    fn test_all_missing_target_left_for_fallback() {
        let estimator = NeighborEstimator::new(3);
        let mut df = df![
            "x" => [1.0, 2.0],
            "target" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let outcomes = estimator.fill(&mut df, &["target"], &["x"]).unwrap();
        assert_eq!(outcomes[0].1, FillOutcome::unchanged());
        assert_eq!(df.column("target").unwrap().null_count(), 2);
    }

    #[test]
    fn test_nearest_returns_sorted() {
        let estimator = NeighborEstimator::new(2);
        let matrix = vec![vec![0.0], vec![3.0], vec![1.0], vec![2.0]];
        let nearest = estimator.nearest(&matrix, 0, &[1, 2, 3]);
        let rows: Vec<usize> = nearest.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn test_zero_variance_feature_is_not_scaled() {
        let estimator = NeighborEstimator::new(1);
        let df = df![
            "constant" => [4.0, 4.0],
            "spread" => [1i64, 3],
        ]
        .unwrap();

        let matrix = estimator.feature_matrix(&df, &["constant", "spread"]).unwrap();
        let expected = [[0.0, -1.0], [0.0, 1.0]];
        for (row, want) in matrix.iter().zip(expected) {
            for (got, want) in row.iter().zip(want) {
                assert!((got - want).abs() < 1e-12);
            }
        }
    }
}
