//! Progress reporting for the analysis pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use house_imputation::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Validating input and configuration
    Initializing,
    /// Measuring missingness before any change
    MissingnessAnalysis,
    /// Dropping mostly-missing columns
    Pruning,
    /// Running the imputation steps
    Imputation,
    /// Adding derived columns
    FeatureEngineering,
    /// Correlating numeric columns with the target
    CorrelationAnalysis,
    /// Detecting target outliers
    OutlierDetection,
    /// Writing the imputed table and reports
    ReportGeneration,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl AnalysisStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::MissingnessAnalysis => "Analyzing Missingness",
            Self::Pruning => "Pruning Columns",
            Self::Imputation => "Imputing Values",
            Self::FeatureEngineering => "Engineering Features",
            Self::CorrelationAnalysis => "Analyzing Correlations",
            Self::OutlierDetection => "Detecting Outliers",
            Self::ReportGeneration => "Generating Reports",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of overall progress this stage accounts for (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::MissingnessAnalysis => 0.08,
            Self::Pruning => 0.05,
            Self::Imputation => 0.45,
            Self::FeatureEngineering => 0.08,
            Self::CorrelationAnalysis => 0.12,
            Self::OutlierDetection => 0.05,
            Self::ReportGeneration => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::MissingnessAnalysis => 0.02,
            Self::Pruning => 0.10,
            Self::Imputation => 0.15,
            Self::FeatureEngineering => 0.60,
            Self::CorrelationAnalysis => 0.68,
            Self::OutlierDetection => 0.80,
            Self::ReportGeneration => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,

    /// Optional sub-stage description (e.g., "Step 3/6: random mode")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: AnalysisStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during a pipeline run.
///
/// Implementations must be `Send + Sync` so a pipeline can be shared across
/// threads.
pub trait ProgressReporter: Send + Sync {
    /// Called at every stage boundary and after each imputation step.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(AnalysisStage::Imputation, 0.5, "Imputing...");
        assert_eq!(update.stage, AnalysisStage::Imputation);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            AnalysisStage::Imputation,
            "Step 3/6: random mode",
            3,
            6,
            "Filled random-missing columns",
        );
        assert_eq!(update.sub_stage.as_deref(), Some("Step 3/6: random mode"));
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.items_processed, Some(3));
        assert_eq!(update.items_total, Some(6));
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done!");
        assert_eq!(update.stage, AnalysisStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            AnalysisStage::Initializing,
            AnalysisStage::MissingnessAnalysis,
            AnalysisStage::Pruning,
            AnalysisStage::Imputation,
            AnalysisStage::FeatureEngineering,
            AnalysisStage::CorrelationAnalysis,
            AnalysisStage::OutlierDetection,
            AnalysisStage::ReportGeneration,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");

        for pair in stages.windows(2) {
            let end = pair[0].base_progress() + pair[0].weight();
            assert!((end - pair[1].base_progress()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(AnalysisStage::Pruning, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&AnalysisStage::MissingnessAnalysis).unwrap();
        assert_eq!(json, "\"missingness_analysis\"");
        let json = serde_json::to_string(&AnalysisStage::ReportGeneration).unwrap();
        assert_eq!(json, "\"report_generation\"");
    }
}
