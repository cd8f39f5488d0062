//! CLI entry point for the housing data imputation pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use house_imputation::utils::read_csv;
use house_imputation::{
    AnalysisReport, MechanismClassifier, MissingnessAnalyzer, Pipeline, PipelineConfig,
    PipelineResult, ReportGenerator,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Missingness analysis and imputation for housing sale records",
    long_about = "Classifies every column with missing values by its missingness mechanism,\n\
                  fills it with the matching strategy and writes the imputed table plus reports.\n\n\
                  The literal NA in the input is read as a missing value.\n\n\
                  EXAMPLES:\n  \
                  # Impute and write outputs to ./output\n  \
                  house-imputation -i train.csv\n\n  \
                  # Drop columns more than 80% missing before imputing\n  \
                  house-imputation -i train.csv --drop-threshold 0.8\n\n  \
                  # Preview the mechanism assigned to each column\n  \
                  house-imputation -i train.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the imputed table and reports
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Custom file name for the imputed table (without extension)
    ///
    /// If not specified, uses "train_imputed"
    #[arg(long)]
    output_name: Option<String>,

    /// Numeric target column used for correlations and outliers
    #[arg(short, long, default_value = "SalePrice")]
    target: String,

    /// Number of neighbors for nearest-neighbor estimation
    #[arg(short, long, default_value = "5")]
    knn_neighbors: usize,

    /// Drop columns missing in more than this fraction of rows (0.0 - 1.0)
    ///
    /// Pruning is disabled unless this is set
    #[arg(long)]
    drop_threshold: Option<f64>,

    /// Number of columns and correlations listed in the summary
    #[arg(long, default_value = "15")]
    top: usize,

    /// Skip derived features and log transforms
    #[arg(long)]
    no_features: bool,

    /// Write only the imputed table, no report files
    #[arg(long)]
    no_reports: bool,

    /// Show the missingness and planned strategy per column without imputing
    #[arg(long)]
    dry_run: bool,

    /// Output the JSON report to stdout instead of the text summary
    ///
    /// Disables all progress logs.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    if args.dry_run {
        info!("Loading dataset from: {}", args.input.display());
        let data = read_csv(&args.input)?;
        return run_dry_run(&args, &data);
    }

    let mut config_builder = PipelineConfig::builder()
        .output_dir(args.output.clone())
        .target_column(&args.target)
        .knn_neighbors(args.knn_neighbors)
        .top_missing(args.top)
        .top_correlations(args.top)
        .engineer_features(!args.no_features)
        .generate_reports(!args.no_reports);

    if let Some(threshold) = args.drop_threshold {
        config_builder = config_builder.drop_missing_threshold(threshold);
    }
    if let Some(ref name) = args.output_name {
        config_builder = config_builder.output_name(name);
    }

    let config = config_builder.build()?;
    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(&pipeline, &args)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.sub_stage.as_deref().unwrap_or(update.stage.display_name()),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

fn run_pipeline(pipeline: &Pipeline, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(60));
    info!("Starting imputation pipeline...");
    info!("{}", "=".repeat(60));

    match pipeline.process_file(&args.input) {
        Ok(result) => handle_pipeline_output(&result, args),
        Err(e) => {
            error!("Pipeline failed [{}]: {}", e.error_code(), e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Print the run result.
///
/// - Default: human-readable summary
/// - `--json`: the full JSON report only
fn handle_pipeline_output(result: &PipelineResult, args: &Args) -> Result<()> {
    let input = args.input.display().to_string();
    let report = AnalysisReport::from_result(Some(&input), result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let generator = ReportGenerator::new(args.output.clone(), args.output_name.clone())
        .with_limits(args.top, args.top);
    println!();
    print!("{}", generator.render_summary(&report)?);

    println!("Files written:");
    for path in &result.output_files {
        println!("  - {}", path.display());
    }
    println!("Use --json for machine-readable output");

    Ok(())
}

/// Show what the pipeline would do without imputing.
///
/// Uses `println!` for user-facing output so it is visible regardless of log
/// level.
fn run_dry_run(args: &Args, data: &DataFrame) -> Result<()> {
    let snapshot = MissingnessAnalyzer::analyze(data);

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of imputation strategy");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", snapshot.rows);
    println!("  Columns: {}", snapshot.columns);
    println!(
        "  Missing cells: {} ({:.2}%)",
        snapshot.total_missing,
        snapshot.overall_percentage()
    );
    println!();

    if snapshot.is_complete() {
        println!("  No missing values, nothing to impute");
        println!("{}", "=".repeat(80));
        return Ok(());
    }

    println!("MISSING COLUMNS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<16} {:<12} {:>8} {:>10}  {:<20} {}",
        "Column", "Kind", "Missing", "Missing %", "Mechanism", "Strategy"
    );
    println!("{}", "-".repeat(90));

    for stats in &snapshot.missing_columns {
        let classification = MechanismClassifier::classify(&stats.column);
        let strategy = if classification.is_classified() {
            classification
                .rules
                .iter()
                .map(|rule| rule.step().to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        } else {
            "fallback (median / mode)".to_string()
        };

        println!(
            "{:<16} {:<12} {:>8} {:>9.2}%  {:<20} {}",
            truncate_str(&stats.column, 15),
            stats.kind.display_name(),
            stats.missing,
            stats.percentage,
            classification.mechanism.display_name(),
            strategy
        );
    }
    println!();

    if let Some(threshold) = args.drop_threshold {
        println!("PRUNING PREVIEW");
        println!("{}", "-".repeat(40));
        let dropped: Vec<&str> = snapshot
            .columns_above(threshold)
            .into_iter()
            .filter(|column| *column != args.target)
            .collect();
        if dropped.is_empty() {
            println!("  No columns exceed {:.0}% missing", threshold * 100.0);
        } else {
            println!(
                "  Will drop columns with >{:.0}% missing: {:?}",
                threshold * 100.0,
                dropped
            );
        }
        println!();
    }

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let output_name = args.output_name.as_deref().unwrap_or("train_imputed");
    println!("  - {}", output_path(&args.output, &format!("{}.csv", output_name)));
    if !args.no_reports {
        for file in [
            "missing_value_report.csv",
            "correlation_analysis.csv",
            "new_features.csv",
            "imputation_report.json",
            "imputation_report.txt",
        ] {
            println!("  - {}", output_path(&args.output, file));
        }
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To run the imputation, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn output_path(dir: &Path, file: &str) -> String {
    dir.join(file).display().to_string()
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
