use crate::analysis::FeatureCorrelation;
use crate::features::DerivedFeature;
use crate::pipeline::PipelineResult;
use crate::quality::{MissingnessSnapshot, OutlierSummary};
use crate::reporting::ImputationReport;
use crate::types::ColumnImputationSummary;
use anyhow::Result;
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Full record of an analysis run, written as `imputation_report.json` and
/// printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: Option<String>,
    /// Path of the imputed table, if written
    pub output_file: Option<String>,
    pub target_column: String,
    pub duration_ms: u64,

    pub rows: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub dropped_columns: Vec<String>,

    /// Missingness of the input, before pruning and imputation
    pub missingness: MissingnessSnapshot,
    pub imputation: ImputationReport,
    /// Imputation folded per column
    pub imputed_columns: Vec<ColumnImputationSummary>,
    pub derived_features: Vec<DerivedFeature>,
    pub correlations: Vec<FeatureCorrelation>,
    pub target_outliers: Option<OutlierSummary>,
}

impl AnalysisReport {
    pub fn from_result(input_file: Option<&str>, result: &PipelineResult) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(String::from),
            output_file: result
                .output_files
                .first()
                .map(|path| path.display().to_string()),
            target_column: result.target_column.clone(),
            duration_ms: result.duration_ms,
            rows: result.table.height(),
            columns_before: result.missingness.columns,
            columns_after: result.table.width(),
            dropped_columns: result.dropped_columns.clone(),
            missingness: result.missingness.clone(),
            imputation: result.imputation.clone(),
            imputed_columns: result.imputation.column_summaries(),
            derived_features: result.derived_features.clone(),
            correlations: result.correlations.clone(),
            target_outliers: result.target_outliers.clone(),
        }
    }
}

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
    top_missing: usize,
    top_correlations: usize,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(PathBuf::from("output"), None)
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
            top_missing: 15,
            top_correlations: 10,
        }
    }

    /// Limit how many columns and correlations the text summary lists.
    pub fn with_limits(mut self, top_missing: usize, top_correlations: usize) -> Self {
        self.top_missing = top_missing;
        self.top_correlations = top_correlations;
        self
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Write the imputed table as `<output_name>.csv`.
    pub fn write_imputed_table(&self, df: &mut DataFrame) -> Result<PathBuf> {
        let file_name = self.output_name.as_deref().unwrap_or("train_imputed");
        let path = self.write_csv(df, &format!("{}.csv", file_name))?;
        info!("Dataset saved: {}", path.display());
        Ok(path)
    }

    /// Write every report file for a finished run. Returns the written paths.
    pub fn write_reports(&self, report: &AnalysisReport) -> Result<Vec<PathBuf>> {
        let paths = vec![
            self.write_missing_report(&report.missingness)?,
            self.write_correlations(&report.correlations)?,
            self.write_new_features(&report.derived_features)?,
            self.write_json_report(report)?,
            self.write_text_summary(report)?,
        ];
        info!("Reports saved to {}", self.output_dir.display());
        Ok(paths)
    }

    pub fn write_missing_report(&self, snapshot: &MissingnessSnapshot) -> Result<PathBuf> {
        let stats = &snapshot.missing_columns;
        let mut df = df![
            "column" => stats.iter().map(|s| s.column.as_str()).collect::<Vec<_>>(),
            "kind" => stats.iter().map(|s| s.kind.display_name()).collect::<Vec<_>>(),
            "missing" => stats.iter().map(|s| s.missing as u64).collect::<Vec<_>>(),
            "percentage" => stats.iter().map(|s| round2(s.percentage)).collect::<Vec<_>>(),
        ]?;
        self.write_csv(&mut df, "missing_value_report.csv")
    }

    pub fn write_correlations(&self, correlations: &[FeatureCorrelation]) -> Result<PathBuf> {
        let mut df = df![
            "feature" => correlations.iter().map(|c| c.feature.as_str()).collect::<Vec<_>>(),
            "correlation" => correlations.iter().map(|c| c.correlation).collect::<Vec<_>>(),
            "strength" => correlations.iter().map(|c| c.strength()).collect::<Vec<_>>(),
            "pairs" => correlations.iter().map(|c| c.pairs as u64).collect::<Vec<_>>(),
        ]?;
        self.write_csv(&mut df, "correlation_analysis.csv")
    }

    pub fn write_new_features(&self, features: &[DerivedFeature]) -> Result<PathBuf> {
        let mut df = df![
            "feature" => features.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            "sources" => features.iter().map(|f| f.sources.join(";")).collect::<Vec<_>>(),
            "formula" => features.iter().map(|f| f.formula.as_str()).collect::<Vec<_>>(),
        ]?;
        self.write_csv(&mut df, "new_features.csv")
    }

    pub fn write_json_report(&self, report: &AnalysisReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("imputation_report.json");
        let mut file = File::create(&path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;
        Ok(path)
    }

    pub fn write_text_summary(&self, report: &AnalysisReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("imputation_report.txt");
        fs::write(&path, self.render_summary(report)?)?;
        Ok(path)
    }

    /// Human-readable summary of a run.
    pub fn render_summary(&self, report: &AnalysisReport) -> Result<String> {
        let rule = "=".repeat(60);
        let imputation = &report.imputation;
        let mut out = String::new();

        writeln!(out, "{}", rule)?;
        writeln!(out, "House Price Data Imputation Report")?;
        writeln!(out, "{}", rule)?;
        writeln!(out, "Generated: {}", report.generated_at)?;
        if let Some(input) = &report.input_file {
            writeln!(out, "Input: {}", input)?;
        }
        if let Some(output) = &report.output_file {
            writeln!(out, "Output: {}", output)?;
        }
        writeln!(
            out,
            "Shape: {} rows x {} columns ({} after pruning)",
            report.rows, report.columns_before, report.columns_after
        )?;
        writeln!(out)?;

        writeln!(out, "Missing values:")?;
        writeln!(
            out,
            "  Before imputation: {} cells in {} columns ({:.2}% of all cells)",
            imputation.missing_before(),
            report.missingness.missing_columns.len(),
            report.missingness.overall_percentage()
        )?;
        writeln!(out, "  After imputation:  {} cells", imputation.missing_after())?;
        writeln!(out, "  Resolution rate:   {:.1}%", imputation.resolution_rate())?;
        for stats in report.missingness.top(self.top_missing) {
            writeln!(
                out,
                "    {:<16} {:>6.2}% ({})",
                stats.column, stats.percentage, stats.missing
            )?;
        }
        if !report.dropped_columns.is_empty() {
            writeln!(out, "  Dropped: {}", report.dropped_columns.join(", "))?;
        }
        writeln!(out)?;

        writeln!(out, "Imputation:")?;
        for record in imputation.records().iter().filter(|r| r.filled > 0) {
            writeln!(
                out,
                "  [{}] {:<14} {:<20} {:>5} cells  {} ({})",
                record.step.number(),
                record.column,
                record.filler.display_name(),
                record.filled,
                record.value,
                record.mechanism.display_name()
            )?;
        }
        writeln!(out)?;

        writeln!(out, "By column:")?;
        for summary in &report.imputed_columns {
            let fillers: Vec<&str> = summary.fillers.iter().map(|f| f.display_name()).collect();
            writeln!(
                out,
                "  {:<14} {:>5} cells  {}",
                summary.column,
                summary.filled,
                fillers.join(" + ")
            )?;
        }
        writeln!(out)?;

        if !report.correlations.is_empty() {
            writeln!(out, "Correlation with {}:", report.target_column)?;
            for correlation in report.correlations.iter().take(self.top_correlations) {
                writeln!(
                    out,
                    "  {:<16} {:>7.3} ({})",
                    correlation.feature,
                    correlation.correlation,
                    correlation.strength()
                )?;
            }
            writeln!(out)?;
        }

        if !report.derived_features.is_empty() {
            writeln!(out, "Derived features:")?;
            for feature in &report.derived_features {
                writeln!(out, "  {} = {}", feature.name, feature.formula)?;
            }
            writeln!(out)?;
        }

        if let Some(outliers) = &report.target_outliers {
            writeln!(
                out,
                "Outliers in {}: {} ({:.2}%) outside [{:.2}, {:.2}]",
                outliers.column,
                outliers.outliers,
                outliers.outlier_percentage,
                outliers.lower_bound,
                outliers.upper_bound
            )?;
        }
        writeln!(out, "{}", rule)?;

        Ok(out)
    }

    fn write_csv(&self, df: &mut DataFrame, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)?;
        Ok(path)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
