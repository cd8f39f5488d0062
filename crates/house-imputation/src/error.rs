//! Custom error types for the imputation pipeline.
//!
//! Fillers surface these errors immediately to the orchestrator, which aborts
//! the run without handing back a partially imputed table.
//!
//! Errors are serializable so that report consumers can receive a stable
//! `{code, message}` pair instead of a free-form string.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation pipeline.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Mode-fill was attempted on a column with no present values.
    #[error("No mode available for column '{0}': every value is missing")]
    NoModeAvailable(String),

    /// A numeric statistic could not be computed because no values are present.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A step ran before one of the steps it depends on.
    #[error("Pipeline ordering violation: {0}")]
    PipelineOrderingViolation(String),

    /// The run finished with missing cells left in the table.
    #[error("Imputation incomplete: {remaining} missing cells remain in {columns:?}")]
    IncompletePipeline {
        remaining: usize,
        columns: Vec<String>,
    },

    /// Column holds values of a type the filler cannot operate on.
    #[error("Column '{column}' is not {expected}")]
    TypeMismatch { column: String, expected: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Post-imputation analysis (features, correlations, outliers) failed.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap any context layers and return the originating error.
    pub fn root_cause(&self) -> &ImputationError {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get a stable error code.
    ///
    /// Context layers are transparent: the code of the originating error is returned.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoModeAvailable(_) => "NO_MODE_AVAILABLE",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::PipelineOrderingViolation(_) => "PIPELINE_ORDERING_VIOLATION",
            Self::IncompletePipeline { .. } => "INCOMPLETE_PIPELINE",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the contents of the table rather than
    /// by how the pipeline was assembled.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::NoModeAvailable(_)
                | Self::NoValidValues(_)
                | Self::TypeMismatch { .. }
                | Self::ColumnNotFound(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}
