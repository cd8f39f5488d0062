//! Main analysis pipeline module.
//!
//! This module provides the `Pipeline` struct and builder that wrap the core
//! [`ImputationPipeline`] with missingness diagnostics, column pruning,
//! feature engineering, correlation analysis and report writing.

use crate::analysis::{FeatureCorrelation, target_correlations};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{ImputationError, Result, ResultExt};
use crate::features::{DerivedFeature, FeatureEngineer};
use crate::pipeline::executor::ImputationPipeline;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::quality::{
    MissingnessAnalyzer, MissingnessSnapshot, OutlierDetector, OutlierSummary,
    drop_high_missing_columns,
};
use crate::reporting::{AnalysisReport, ImputationReport, ReportGenerator};
use crate::utils::{has_column, is_numeric_dtype, read_csv};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Everything produced by one analysis run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Imputed table, including derived feature columns
    pub table: DataFrame,
    pub target_column: String,
    /// Missingness of the input table
    pub missingness: MissingnessSnapshot,
    pub dropped_columns: Vec<String>,
    pub imputation: ImputationReport,
    pub derived_features: Vec<DerivedFeature>,
    pub correlations: Vec<FeatureCorrelation>,
    pub target_outliers: Option<OutlierSummary>,
    /// Files written, imputed table first
    pub output_files: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// The full analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use house_imputation::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().drop_missing_threshold(0.8).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    imputer: ImputationPipeline,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    reporter: ReportGenerator,
}

// Pipelines may be built on one thread and run on another
static_assertions::assert_impl_all!(Pipeline: Send, Sync);
static_assertions::assert_impl_all!(PipelineResult: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the analysis over a table.
    ///
    /// Imputation errors abort the run; no table or report files are written
    /// for a failed run.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.process_labeled(df, None)
    }

    /// Load a CSV file (treating `NA` as missing) and run the analysis.
    ///
    /// The file path is recorded in the written report.
    pub fn process_file(&self, path: &Path) -> Result<PipelineResult> {
        let df = read_csv(path).context(format!("Failed to load '{}'", path.display()))?;
        info!("Loaded {} rows x {} columns from {}", df.height(), df.width(), path.display());
        self.process_labeled(df, Some(&path.display().to_string()))
    }

    fn process_labeled(&self, df: DataFrame, input_file: Option<&str>) -> Result<PipelineResult> {
        match self.process_internal(df, input_file) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, mut df: DataFrame, input_file: Option<&str>) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let target = self.config.target_column.as_str();

        info!("Starting analysis pipeline...");
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Initializing,
            0.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        // Step 1: missingness of the raw input
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::MissingnessAnalysis,
            0.0,
            "Analyzing missing values...",
        ));
        let missingness = MissingnessAnalyzer::analyze(&df);
        info!(
            "Step 1: {} missing cells in {} columns",
            missingness.total_missing,
            missingness.missing_columns.len()
        );

        // Step 2: optional pruning
        let dropped_columns = match self.config.drop_missing_threshold {
            Some(threshold) => {
                self.report_progress(ProgressUpdate::new(
                    AnalysisStage::Pruning,
                    0.0,
                    format!("Dropping columns above {:.0}% missing...", threshold * 100.0),
                ));
                drop_high_missing_columns(&mut df, threshold, target)?
            }
            None => Vec::new(),
        };

        // Step 3: imputation
        info!("Step 3: Imputing missing values...");
        let total_steps = self.imputer.steps().len();
        let mut completed = 0;
        let outcome = self.imputer.run_with(&df, |step, remaining| {
            completed += 1;
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Imputation,
                format!("Step {}/{}: {}", completed, total_steps, step),
                completed,
                total_steps,
                format!("{} missing cells remaining", remaining),
            ));
        })?;
        let mut table = outcome.table;

        // Step 4: derived features
        let mut derived_features = Vec::new();
        if self.config.engineer_features {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::FeatureEngineering,
                0.0,
                "Creating derived features...",
            ));
            derived_features.extend(
                FeatureEngineer::create_features(&mut table)
                    .map_err(|e| ImputationError::AnalysisFailed(e.to_string()))?,
            );
            derived_features.extend(
                FeatureEngineer::log_transform(&mut table, &self.config.log_transform_columns)
                    .map_err(|e| ImputationError::AnalysisFailed(e.to_string()))?,
            );
        }

        // Step 5: correlations and outliers of the target
        let target_usable = has_column(&table, target)
            && table
                .column(target)
                .map(|col| is_numeric_dtype(col.dtype()))
                .unwrap_or(false);

        let (correlations, target_outliers) = if target_usable {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::CorrelationAnalysis,
                0.0,
                format!("Correlating features with {}...", target),
            ));
            // columns derived from the target only restate it
            let target_derived: Vec<&str> = derived_features
                .iter()
                .filter(|feature| feature.sources.iter().any(|source| source == target))
                .map(|feature| feature.name.as_str())
                .collect();
            let correlations = target_correlations(&table, target, &target_derived)
                .map_err(|e| ImputationError::AnalysisFailed(e.to_string()))?;

            self.report_progress(ProgressUpdate::new(
                AnalysisStage::OutlierDetection,
                0.0,
                format!("Detecting outliers in {}...", target),
            ));
            (correlations, OutlierDetector::detect(&table, target)?)
        } else {
            warn!(
                "Target column '{}' missing or not numeric, skipping correlation analysis",
                target
            );
            (Vec::new(), None)
        };

        let mut result = PipelineResult {
            table,
            target_column: target.to_string(),
            missingness,
            dropped_columns,
            imputation: outcome.report,
            derived_features,
            correlations,
            target_outliers,
            output_files: Vec::new(),
            duration_ms: 0,
        };

        // Step 6: output files
        if self.config.save_to_disk {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::ReportGeneration,
                0.0,
                "Saving imputed table and reports...",
            ));
            let table_path = self
                .reporter
                .write_imputed_table(&mut result.table)
                .map_err(|e| ImputationError::ReportGenerationFailed(e.to_string()))?;
            result.output_files.push(table_path);

            if self.config.generate_reports {
                result.duration_ms = start_time.elapsed().as_millis() as u64;
                let report = AnalysisReport::from_result(input_file, &result);
                let paths = self
                    .reporter
                    .write_reports(&report)
                    .map_err(|e| ImputationError::ReportGenerationFailed(e.to_string()))?;
                result.output_files.extend(paths);
            }
        }

        result.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Analysis complete in {} ms: {} cells imputed, {} features added",
            result.duration_ms,
            result.imputation.cells_filled(),
            result.derived_features.len()
        );
        Ok(result)
    }
}

/// Builder for creating a [`Pipeline`] instance.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone())
            .with_limits(config.top_missing, config.top_correlations);

        Ok(Pipeline {
            imputer: ImputationPipeline::new(config.knn_neighbors),
            config,
            progress_reporter: self.progress_reporter,
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::total_missing;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn in_memory() -> PipelineConfig {
        PipelineConfig::builder().save_to_disk(false).build().unwrap()
    }

    fn sample() -> DataFrame {
        df![
            "Id" => [1i64, 2, 3, 4, 5],
            "PoolQC" => [Option::<&str>::None, None, None, None, Some("Gd")],
            "Alley" => [None, None, None, None, Some("Grvl")],
            "Neighborhood" => ["A", "A", "B", "B", "B"],
            "LotFrontage" => [Some(60.0), None, Some(80.0), Some(70.0), None],
            "YearBuilt" => [2000i64, 1990, 1970, 2005, 1950],
            "YrSold" => [2008i64, 2008, 2009, 2010, 2007],
            "PoolArea" => [0i64, 0, 0, 0, 500],
            "SalePrice" => [200000i64, 180000, 140000, 250000, 120000],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config.knn_neighbors, 5);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            knn_neighbors: 0,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_in_memory() {
        let result = Pipeline::builder()
            .config(in_memory())
            .build()
            .unwrap()
            .process(sample())
            .unwrap();

        assert_eq!(total_missing(&result.table), 0);
        assert_eq!(result.missingness.total_missing, 10);
        assert_eq!(result.imputation.missing_after(), 0);
        assert!(result.output_files.is_empty());

        let derived: Vec<&str> = result.derived_features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(derived, vec!["HouseAge", "HasPool", "log_SalePrice"]);
        assert!(result.table.column("log_SalePrice").is_ok());

        assert!(result.correlations.iter().any(|c| c.feature == "YearBuilt"));
        assert!(result.target_outliers.is_some());
    }

    #[test]
    fn test_target_transform_not_correlated_with_target() {
        let result = Pipeline::builder()
            .config(in_memory())
            .build()
            .unwrap()
            .process(sample())
            .unwrap();

        assert!(result.table.column("log_SalePrice").is_ok());
        assert!(result.correlations.iter().all(|c| c.feature != "log_SalePrice"));
        assert!(result.correlations.iter().any(|c| c.feature == "HouseAge"));
    }

    #[test]
    fn test_process_with_pruning() {
        let config = PipelineConfig::builder()
            .save_to_disk(false)
            .drop_missing_threshold(0.7)
            .engineer_features(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(sample())
            .unwrap();

        assert_eq!(result.dropped_columns, vec!["PoolQC", "Alley"]);
        assert!(result.table.column("PoolQC").is_err());
        assert!(result.derived_features.is_empty());
        assert_eq!(result.imputation.missing_before(), 2);
    }

    #[test]
    fn test_progress_reported_for_each_step() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let imputation_updates = Arc::new(AtomicUsize::new(0));
        let imputation_clone = imputation_updates.clone();

        Pipeline::builder()
            .config(in_memory())
            .on_progress(move |update| {
                if update.stage == AnalysisStage::Imputation {
                    imputation_clone.fetch_add(1, Ordering::SeqCst);
                }
                if let Ok(mut seen) = stages_clone.lock() {
                    seen.push(update.stage);
                }
            })
            .build()
            .unwrap()
            .process(sample())
            .unwrap();

        assert_eq!(imputation_updates.load(Ordering::SeqCst), 6);
        let seen = stages.lock().unwrap();
        assert_eq!(seen.first(), Some(&AnalysisStage::Initializing));
        assert_eq!(seen.last(), Some(&AnalysisStage::Complete));
    }

    #[test]
    fn test_failed_run_reports_failure() {
        let failed = Arc::new(AtomicUsize::new(0));
        let failed_clone = failed.clone();
        let df = df![
            "Electrical" => [Option::<&str>::None, None],
            "SalePrice" => [1.0, 2.0],
        ]
        .unwrap();

        let err = Pipeline::builder()
            .config(in_memory())
            .on_progress(move |update| {
                if update.stage == AnalysisStage::Failed {
                    failed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap()
            .process(df)
            .unwrap_err();

        assert_eq!(err.error_code(), "NO_MODE_AVAILABLE");
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }
}
