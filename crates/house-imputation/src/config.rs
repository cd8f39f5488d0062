//! Configuration types for the analysis and imputation pipeline.
//!
//! Column lists and mechanism assignments are not configurable; they live in
//! the declarative schema table in [`crate::classifier`]. This module only
//! covers run parameters such as the neighbor count and output locations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of neighbors for nearest-neighbor estimation.
pub const DEFAULT_KNN_NEIGHBORS: usize = 5;

/// Default target column of the housing dataset.
pub const DEFAULT_TARGET_COLUMN: &str = "SalePrice";

/// Configuration for the analysis pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use house_imputation::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .knn_neighbors(5)
///     .drop_missing_threshold(0.8)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of neighbors used by the nearest-neighbor estimator.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Numeric target column (never dropped, used for correlations).
    /// Default: "SalePrice"
    pub target_column: String,

    /// Columns whose missing fraction is strictly above this value are
    /// dropped before imputation (0.0 - 1.0). `None` disables pruning.
    /// Default: None
    pub drop_missing_threshold: Option<f64>,

    /// Number of columns listed in the missingness summary.
    /// Default: 15
    pub top_missing: usize,

    /// Number of features listed in the correlation summary.
    /// Default: 10
    pub top_correlations: usize,

    /// Whether to derive HouseAge/TotalArea/HasPool/TotalBath after imputation.
    /// Default: true
    pub engineer_features: bool,

    /// Columns that receive a `log_<name>` companion (ln(1 + x)).
    /// Default: ["SalePrice"]
    pub log_transform_columns: Vec<String>,

    /// Output directory for the imputed table and reports.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// File stem of the imputed table (without extension).
    /// If None, uses "train_imputed".
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to write the imputed table and reports to disk.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write the report files alongside the imputed table.
    /// Default: true
    pub generate_reports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            knn_neighbors: DEFAULT_KNN_NEIGHBORS,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            drop_missing_threshold: None,
            top_missing: 15,
            top_correlations: 10,
            engineer_features: true,
            log_transform_columns: vec![DEFAULT_TARGET_COLUMN.to_string()],
            output_dir: PathBuf::from("output"),
            output_name: None,
            save_to_disk: true,
            generate_reports: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(threshold) = self.drop_missing_threshold
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "drop_missing_threshold".to_string(),
                value: threshold,
            });
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        Ok(())
    }

    /// File stem used for the imputed table.
    pub fn output_stem(&self) -> &str {
        self.output_name.as_deref().unwrap_or("train_imputed")
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Target column name must not be empty")]
    EmptyTargetColumn,
}

impl From<ConfigValidationError> for crate::error::ImputationError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ImputationError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    knn_neighbors: Option<usize>,
    target_column: Option<String>,
    drop_missing_threshold: Option<f64>,
    top_missing: Option<usize>,
    top_correlations: Option<usize>,
    engineer_features: Option<bool>,
    log_transform_columns: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
    generate_reports: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the number of neighbors for nearest-neighbor estimation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Enable pruning of columns with too many missing values.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.8 = 80%)
    pub fn drop_missing_threshold(mut self, threshold: f64) -> Self {
        self.drop_missing_threshold = Some(threshold);
        self
    }

    /// Set how many columns the missingness summary lists.
    pub fn top_missing(mut self, n: usize) -> Self {
        self.top_missing = Some(n);
        self
    }

    /// Set how many features the correlation summary lists.
    pub fn top_correlations(mut self, n: usize) -> Self {
        self.top_correlations = Some(n);
        self
    }

    /// Enable or disable derived feature creation.
    pub fn engineer_features(mut self, enable: bool) -> Self {
        self.engineer_features = Some(enable);
        self
    }

    /// Set the columns that receive a log-transformed companion.
    pub fn log_transform_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_transform_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the output directory for reports and the imputed table.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom file stem for the imputed table.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable writing results to disk.
    ///
    /// When false, results are kept in memory only.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable report generation.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
            target_column: self.target_column.unwrap_or(defaults.target_column),
            drop_missing_threshold: self.drop_missing_threshold,
            top_missing: self.top_missing.unwrap_or(defaults.top_missing),
            top_correlations: self.top_correlations.unwrap_or(defaults.top_correlations),
            engineer_features: self.engineer_features.unwrap_or(defaults.engineer_features),
            log_transform_columns: self
                .log_transform_columns
                .unwrap_or(defaults.log_transform_columns),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
            generate_reports: self.generate_reports.unwrap_or(defaults.generate_reports),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.knn_neighbors, 5);
        assert_eq!(config.target_column, "SalePrice");
        assert!(config.drop_missing_threshold.is_none());
        assert_eq!(config.output_stem(), "train_imputed");
        assert!(config.save_to_disk);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .knn_neighbors(3)
            .drop_missing_threshold(0.8)
            .target_column("Price")
            .output_name("imputed")
            .engineer_features(false)
            .log_transform_columns(["Price", "LotArea"])
            .build()
            .unwrap();

        assert_eq!(config.knn_neighbors, 3);
        assert_eq!(config.drop_missing_threshold, Some(0.8));
        assert_eq!(config.target_column, "Price");
        assert_eq!(config.output_stem(), "imputed");
        assert!(!config.engineer_features);
        assert_eq!(config.log_transform_columns, vec!["Price", "LotArea"]);
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = PipelineConfig::builder()
            .drop_missing_threshold(1.5)
            .build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_validation_zero_neighbors() {
        let result = PipelineConfig::builder().knn_neighbors(0).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidKnnNeighbors(0))
        ));
    }

    #[test]
    fn test_validation_empty_target() {
        let result = PipelineConfig::builder().target_column("  ").build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::EmptyTargetColumn)
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PipelineConfig::builder().knn_neighbors(7).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.knn_neighbors, 7);
    }
}
