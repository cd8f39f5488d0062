//! Report generation module.
//!
//! [`ImputationReport`] is the ordered record of one imputation run.
//! [`ReportGenerator`] writes the imputed table and the report files of a
//! full analysis run:
//!
//! - `missing_value_report.csv`
//! - `correlation_analysis.csv`
//! - `new_features.csv`
//! - `imputation_report.json` (the [`AnalysisReport`])
//! - `imputation_report.txt`
//!
//! # Example
//!
//! ```rust,ignore
//! use house_imputation::reporting::{AnalysisReport, ReportGenerator};
//!
//! let report = AnalysisReport::from_result(Some("data/train.csv"), &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), None);
//! generator.write_reports(&report)?;
//! ```

mod generator;
mod imputation;

pub use generator::{AnalysisReport, ReportGenerator};
pub use imputation::ImputationReport;
