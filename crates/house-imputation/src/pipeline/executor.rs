//! Imputation executor module.
//!
//! Runs the ordered imputation steps over a working copy of the table and
//! checks that nothing is left missing.

use crate::classifier::{FillRule, MechanismClassifier};
use crate::config::DEFAULT_KNN_NEIGHBORS;
use crate::error::{ImputationError, Result, ResultExt};
use crate::imputers::{
    ConstantImputer, GroupedMedianImputer, NeighborEstimator, StatisticalImputer,
};
use crate::pipeline::steps::{ImputationStep, validate_order};
use crate::reporting::ImputationReport;
use crate::types::{ColumnImputationRecord, ColumnKind, FillerKind};
use crate::utils::{column_kind, column_names, has_column, is_numeric_dtype, total_missing};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Imputed table and the record of how it was produced.
#[derive(Debug, Clone)]
pub struct ImputationOutcome {
    pub table: DataFrame,
    pub report: ImputationReport,
}

/// Orchestrates the fillers over the declared column groups.
///
/// The caller's table is never modified. A run either returns a table with
/// no missing cells or an error; there is no partial result.
pub struct ImputationPipeline {
    steps: Vec<ImputationStep>,
    estimator: NeighborEstimator,
}

impl Default for ImputationPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_KNN_NEIGHBORS)
    }
}

impl ImputationPipeline {
    /// Pipeline with the canonical step order.
    pub fn new(knn_neighbors: usize) -> Self {
        Self {
            steps: ImputationStep::CANONICAL.to_vec(),
            estimator: NeighborEstimator::new(knn_neighbors),
        }
    }

    /// Pipeline with a custom step order.
    ///
    /// The order is checked against each step's prerequisites up front; a
    /// step scheduled before a step it depends on is a
    /// `PipelineOrderingViolation`.
    pub fn with_steps(knn_neighbors: usize, steps: &[ImputationStep]) -> Result<Self> {
        validate_order(steps)?;
        Ok(Self {
            steps: steps.to_vec(),
            estimator: NeighborEstimator::new(knn_neighbors),
        })
    }

    pub fn steps(&self) -> &[ImputationStep] {
        &self.steps
    }

    pub fn knn_neighbors(&self) -> usize {
        self.estimator.n_neighbors()
    }

    /// Impute every missing cell of `df`.
    ///
    /// Fails with `IncompletePipeline` if any cell is still missing once all
    /// steps have run.
    pub fn run(&self, df: &DataFrame) -> Result<ImputationOutcome> {
        self.run_with(df, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_step` after each step with the
    /// step and the number of cells still missing.
    pub fn run_with<F>(&self, df: &DataFrame, mut on_step: F) -> Result<ImputationOutcome>
    where
        F: FnMut(ImputationStep, usize),
    {
        let mut table = df.clone();
        let mut report = ImputationReport::new(total_missing(&table));
        info!(
            "Imputing {} missing cells across {} columns",
            report.missing_before(),
            table.width()
        );

        for &step in &self.steps {
            debug!("Step {}: {}", step.number(), step);
            match step {
                ImputationStep::GenericFallback => Self::fallback(&mut table, &mut report)?,
                _ => self.apply_declared(step, &mut table, &mut report)?,
            }
            let remaining = total_missing(&table);
            debug!("Step {} done, {} cells still missing", step.number(), remaining);
            on_step(step, remaining);
        }

        let remaining = total_missing(&table);
        if remaining > 0 {
            let columns = table
                .get_columns()
                .iter()
                .filter(|col| col.null_count() > 0)
                .map(|col| col.name().to_string())
                .collect();
            return Err(ImputationError::IncompletePipeline { remaining, columns });
        }

        let report = report.finish(remaining);
        info!(
            "Imputation complete: {} cells filled in {} applications",
            report.cells_filled(),
            report.records().len()
        );
        Ok(ImputationOutcome { table, report })
    }

    /// Apply every declared rule owned by `step`.
    fn apply_declared(
        &self,
        step: ImputationStep,
        table: &mut DataFrame,
        report: &mut ImputationReport,
    ) -> Result<()> {
        let mut neighbor_targets = Vec::new();

        for (spec, rule) in MechanismClassifier::rules_for(step) {
            if !has_column(table, spec.name) {
                debug!("Declared column '{}' not in table, skipping", spec.name);
                continue;
            }

            let (filler, outcome) = match rule {
                FillRule::Constant { sentinel } => (
                    FillerKind::Constant,
                    ConstantImputer::fill(table, spec.name, sentinel, None),
                ),
                FillRule::ConditionalConstant { sentinel, when } => {
                    if !has_column(table, when.column()) {
                        warn!(
                            "Condition column '{}' for '{}' not in table, leaving cells for fallback",
                            when.column(),
                            spec.name
                        );
                        continue;
                    }
                    (
                        FillerKind::Constant,
                        ConstantImputer::fill(table, spec.name, sentinel, Some(when)),
                    )
                }
                FillRule::Mode => (
                    FillerKind::Mode,
                    StatisticalImputer::fill_mode(table, spec.name),
                ),
                FillRule::GroupedMedian { group_by } => {
                    if !has_column(table, group_by) {
                        warn!(
                            "Group column '{}' for '{}' not in table, leaving cells for fallback",
                            group_by, spec.name
                        );
                        continue;
                    }
                    (
                        FillerKind::GroupedMedian,
                        GroupedMedianImputer::fill(table, spec.name, group_by),
                    )
                }
                FillRule::NearestNeighbors => {
                    neighbor_targets.push(spec);
                    continue;
                }
            };

            let outcome = outcome.context(format!("Step '{}' on column '{}'", step, spec.name))?;
            report.push(ColumnImputationRecord::new(
                spec.name,
                spec.mechanism,
                step,
                filler,
                outcome,
            ));
        }

        if !neighbor_targets.is_empty() {
            let targets: Vec<&str> = neighbor_targets.iter().map(|spec| spec.name).collect();
            let features = Self::usable_features(table, &targets);
            if features.is_empty() {
                warn!("No complete feature columns for neighbor estimation, leaving cells for fallback");
                return Ok(());
            }

            let outcomes = self
                .estimator
                .fill(table, &targets, &features)
                .context(format!("Step '{}'", step))?;
            for (spec, (_, outcome)) in neighbor_targets.iter().zip(outcomes) {
                report.push(ColumnImputationRecord::new(
                    spec.name,
                    spec.mechanism,
                    step,
                    FillerKind::NearestNeighbors,
                    outcome,
                ));
            }
        }

        Ok(())
    }

    /// Declared feature columns that exist, are numeric, are not targets and
    /// have no missing cells.
    fn usable_features(table: &DataFrame, targets: &[&str]) -> Vec<&'static str> {
        MechanismClassifier::neighbor_features()
            .iter()
            .copied()
            .filter(|feature| !targets.contains(feature))
            .filter(|feature| match table.column(feature) {
                Ok(col) if !is_numeric_dtype(col.dtype()) => {
                    warn!("Feature column '{}' is not numeric, excluded", feature);
                    false
                }
                Ok(col) if col.null_count() > 0 => {
                    warn!(
                        "Feature column '{}' has {} missing cells, excluded",
                        feature,
                        col.null_count()
                    );
                    false
                }
                Ok(_) => true,
                Err(_) => {
                    debug!("Feature column '{}' not in table", feature);
                    false
                }
            })
            .collect()
    }

    /// Fill whatever is still missing with the column median or mode.
    fn fallback(table: &mut DataFrame, report: &mut ImputationReport) -> Result<()> {
        for name in column_names(table) {
            let series = table.column(&name)?.as_materialized_series();
            if series.null_count() == 0 {
                continue;
            }

            let classification = MechanismClassifier::classify(&name);
            let kind = classification.kind.unwrap_or_else(|| column_kind(series));
            let (filler, outcome) = match kind {
                ColumnKind::Numeric => (FillerKind::Median, StatisticalImputer::fill_median(table, &name)),
                ColumnKind::Categorical => (FillerKind::Mode, StatisticalImputer::fill_mode(table, &name)),
            };
            let outcome = outcome.context(format!(
                "Step '{}' on column '{}'",
                ImputationStep::GenericFallback,
                name
            ))?;

            report.push(ColumnImputationRecord::new(
                name,
                classification.mechanism,
                ImputationStep::GenericFallback,
                filler,
                outcome,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FillValue, MechanismTag};
    use crate::utils::{numeric_values, text_values};

    fn scenario() -> DataFrame {
        let mut electrical: Vec<Option<&str>> = vec![Some("SBrkr"); 10];
        electrical.push(None);
        df![
            "PoolQC" => [Some("None"), Some("None"), None, None, None, Some("Gd"), Some("Ex"), None, Some("Fa"), Some("Gd"), Some("Ex")],
            "Electrical" => electrical,
            "Neighborhood" => ["A", "A", "A", "B", "B", "B", "B", "C", "C", "C", "C"],
            "LotFrontage" => [Some(60.0), Some(70.0), None, Some(80.0), Some(80.0), Some(90.0), Some(85.0), Some(50.0), Some(55.0), Some(52.0), Some(51.0)],
            "Street" => [Some("Pave"), Some("Pave"), Some("Grvl"), None, Some("Pave"), Some("Pave"), Some("Pave"), Some("Pave"), Some("Pave"), Some("Pave"), Some("Pave")],
            "LotArea" => [Some(8450i64), Some(9600), Some(11250), Some(9550), None, Some(14115), Some(10084), Some(10382), Some(6120), Some(7420), Some(11200)],
        ]
        .unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let outcome = ImputationPipeline::default().run(&scenario()).unwrap();
        let table = &outcome.table;

        assert_eq!(total_missing(table), 0);
        let pool = text_values(table, "PoolQC").unwrap();
        assert_eq!(pool[2].as_deref(), Some("None"));
        assert_eq!(pool[7].as_deref(), Some("None"));
        assert_eq!(
            text_values(table, "Electrical").unwrap()[10].as_deref(),
            Some("SBrkr")
        );
        assert_eq!(numeric_values(table, "LotFrontage").unwrap()[2], Some(65.0));
        assert_eq!(text_values(table, "Street").unwrap()[3].as_deref(), Some("Pave"));
    }

    #[test]
    fn test_report_records() {
        let outcome = ImputationPipeline::default().run(&scenario()).unwrap();
        let report = &outcome.report;

        assert_eq!(report.missing_before(), 8);
        assert_eq!(report.missing_after(), 0);
        assert_eq!(report.cells_filled(), 8);

        let pool = report.records_for("PoolQC");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].filled, 4);
        assert_eq!(pool[0].mechanism, MechanismTag::StructuralAbsence);

        let lot = report.records_for("LotFrontage");
        assert_eq!(lot[0].filler, FillerKind::GroupedMedian);
        assert!(matches!(lot[0].value, FillValue::GroupMedians { groups: 3, .. }));

        let fallback = report.records_for_step(ImputationStep::GenericFallback);
        let columns: Vec<&str> = fallback.iter().map(|r| r.column.as_str()).collect();
        assert_eq!(columns, vec!["Street", "LotArea"]);
        assert_eq!(fallback[1].filler, FillerKind::Median);
        assert_eq!(fallback[0].mechanism, MechanismTag::Unclassified);
    }

    #[test]
    fn test_caller_table_untouched() {
        let input = scenario();
        let before = total_missing(&input);
        ImputationPipeline::default().run(&input).unwrap();
        assert_eq!(total_missing(&input), before);
    }

    #[test]
    fn test_idempotent() {
        let pipeline = ImputationPipeline::default();
        let once = pipeline.run(&scenario()).unwrap().table;
        let twice = pipeline.run(&once).unwrap();

        assert!(once.equals_missing(&twice.table));
        assert_eq!(twice.report.cells_filled(), 0);
        assert!(pipeline.run(&scenario()).unwrap().table.equals_missing(&once));
    }

    #[test]
    fn test_misordered_steps_rejected() {
        let result = ImputationPipeline::with_steps(
            5,
            &[
                ImputationStep::NeighborEstimate,
                ImputationStep::StructuralCategorical,
                ImputationStep::StructuralNumeric,
                ImputationStep::RandomMode,
                ImputationStep::GroupedMedian,
                ImputationStep::GenericFallback,
            ],
        );
        assert!(matches!(
            result,
            Err(ImputationError::PipelineOrderingViolation(_))
        ));
    }

    #[test]
    fn test_missing_fallback_step_is_incomplete() {
        let pipeline = ImputationPipeline::with_steps(
            5,
            &[
                ImputationStep::StructuralCategorical,
                ImputationStep::StructuralNumeric,
                ImputationStep::RandomMode,
                ImputationStep::GroupedMedian,
                ImputationStep::NeighborEstimate,
            ],
        )
        .unwrap();

        let err = pipeline.run(&scenario()).unwrap_err();
        match err {
            ImputationError::IncompletePipeline { remaining, columns } => {
                assert_eq!(remaining, 2);
                assert_eq!(columns, vec!["Street", "LotArea"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_missing_mode_column_aborts_run() {
        let df = df![
            "Electrical" => [Option::<&str>::None, None],
            "LotArea" => [1.0, 2.0],
        ]
        .unwrap();

        let err = ImputationPipeline::default().run(&df).unwrap_err();
        assert_eq!(err.error_code(), "NO_MODE_AVAILABLE");
        assert!(matches!(
            err.root_cause(),
            ImputationError::NoModeAvailable(col) if col == "Electrical"
        ));
    }

    #[test]
    fn test_fallback_keeps_boolean_column_boolean() {
        let df = df![
            "HasDeck" => [Some(true), Some(true), None],
            "LotArea" => [1.0, 2.0, 3.0],
        ]
        .unwrap();

        let outcome = ImputationPipeline::default().run(&df).unwrap();

        let column = outcome.table.column("HasDeck").unwrap();
        assert_eq!(column.dtype(), &DataType::Boolean);
        assert_eq!(column.bool().unwrap().get(2), Some(true));
        let records = outcome.report.records_for("HasDeck");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filler, FillerKind::Mode);
    }

    #[test]
    fn test_masvnr_conditional_then_neighbors() {
        let df = df![
            "MasVnrType" => [None, Some("BrkFace"), Some("BrkFace"), Some("BrkFace"), Some("None")],
            "MasVnrArea" => [None, Some(100.0), Some(300.0), None, Some(0.0)],
            "LotArea" => [1000.0, 2000.0, 8000.0, 2100.0, 900.0],
            "GrLivArea" => [800.0, 1500.0, 3000.0, 1550.0, 700.0],
        ]
        .unwrap();

        let outcome = ImputationPipeline::new(1).run(&df).unwrap();
        let area = numeric_values(&outcome.table, "MasVnrArea").unwrap();

        // row 0: type filled to "None" in step 1, so area gets zero in step 2
        assert_eq!(area[0], Some(0.0));
        // row 3: veneer present, estimated from its nearest row (row 1)
        assert_eq!(area[3], Some(100.0));

        let records = outcome.report.records_for("MasVnrArea");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filler, FillerKind::Constant);
        assert_eq!(records[0].filled, 1);
        assert_eq!(records[1].filler, FillerKind::NearestNeighbors);
        assert_eq!(records[1].filled, 1);
    }

    #[test]
    fn test_progress_callback_sees_every_step() {
        let mut seen = Vec::new();
        ImputationPipeline::default()
            .run_with(&scenario(), |step, remaining| seen.push((step, remaining)))
            .unwrap();

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], (ImputationStep::StructuralCategorical, 4));
        assert_eq!(seen[5], (ImputationStep::GenericFallback, 0));
    }
}
