use analytics::PerformanceAnalyzer;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use configuration::{AlignmentPolicy, Config};
use ml_trainer::LogisticClassifier;
use portfolio_backtester::BacktestEngine;
use std::path::PathBuf;
use wfo::WalkForwardHarness;

mod logging;
mod report;

use report::JsonReport;

/// The main entry point for the Meridian research application.
fn main() -> Result<()> {
    // Optional: a .env file may carry MERIDIAN__* overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.command.apply_overrides(&mut config);
    config.validate().context("Invalid configuration after command-line overrides")?;

    let _log_guard = logging::init(&config.logging)?;

    match cli.command {
        Commands::WalkForward(args) => handle_walk_forward(&config, &args.common),
        Commands::Backtest(args) => handle_backtest(&config, &args.common),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Walk-forward evaluation of a cross-sectional equity selection strategy.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrain the model year by year and backtest each following year.
    WalkForward(WalkForwardArgs),
    /// Backtest a table that already carries a score column.
    Backtest(BacktestArgs),
}

/// Options shared by both commands. Each one overrides its config value.
#[derive(Args)]
struct CommonArgs {
    /// Parquet or CSV dataset.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Fraction of each period's cross-section to hold (e.g., 0.2).
    #[arg(long)]
    top_quantile: Option<f64>,

    /// Cost per unit of turnover, in basis points.
    #[arg(long)]
    cost_bps: Option<f64>,

    /// Identifier of the benchmark asset (e.g., "SPY").
    #[arg(long)]
    benchmark: Option<String>,

    /// How portfolio and benchmark series are aligned for the summary.
    #[arg(long, value_enum)]
    alignment: Option<AlignmentPolicy>,

    /// Write the per-period results to this parquet or CSV file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WalkForwardArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First test year.
    #[arg(long)]
    start_year: Option<i32>,

    /// Last test year (inclusive).
    #[arg(long)]
    end_year: Option<i32>,

    /// Run folds in parallel.
    #[arg(long)]
    parallel: bool,

    /// Show a progress bar while folds run.
    #[arg(long)]
    progress: bool,
}

#[derive(Args)]
struct BacktestArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Column holding the pre-computed model score.
    #[arg(long)]
    score_column: Option<String>,
}

impl CommonArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.dataset {
            config.dataset.path = path.clone();
        }
        if let Some(q) = self.top_quantile {
            config.backtest.top_quantile = q;
        }
        if let Some(bps) = self.cost_bps {
            config.backtest.transaction_cost_bps = bps;
        }
        if let Some(benchmark) = &self.benchmark {
            config.backtest.benchmark_id = benchmark.clone();
        }
        if let Some(alignment) = self.alignment {
            config.analysis.alignment = alignment;
        }
    }
}

impl Commands {
    fn apply_overrides(&self, config: &mut Config) {
        match self {
            Commands::WalkForward(args) => {
                args.common.apply(config);
                if let Some(year) = args.start_year {
                    config.walk_forward.start_year = year;
                }
                if let Some(year) = args.end_year {
                    config.walk_forward.end_year = year;
                }
                config.walk_forward.parallel |= args.parallel;
                config.walk_forward.show_progress |= args.progress;
            }
            Commands::Backtest(args) => {
                args.common.apply(config);
                if let Some(column) = &args.score_column {
                    config.dataset.score_column = column.clone();
                }
            }
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Handles the `walk-forward` command.
fn handle_walk_forward(config: &Config, args: &CommonArgs) -> Result<()> {
    let dataset = ml_trainer::load_dataset(&config.dataset)
        .with_context(|| format!("Failed to load dataset from {:?}", config.dataset.path))?;

    let classifier = Box::new(LogisticClassifier::new(&config.model));
    let harness = WalkForwardHarness::from_config(config, classifier)?;
    let report = harness.run(&dataset)?;

    let summary = PerformanceAnalyzer::new(&config.analysis).summarize(&report.results);

    if args.json {
        report::print_json(&JsonReport {
            job_id: Some(report.job_id.to_string()),
            folds: &report.folds,
            skipped: &report.skipped,
            periods: report.results.len(),
            summary,
        })?;
    } else {
        report::print_folds(&report.folds, &report.skipped);
        report::print_summary(&summary);
    }

    if let Some(path) = &args.output {
        report::write_results(path, &report.results)?;
    }
    Ok(())
}

/// Handles the `backtest` command.
fn handle_backtest(config: &Config, args: &CommonArgs) -> Result<()> {
    let observations = ml_trainer::load_scored_observations(&config.dataset)
        .with_context(|| format!("Failed to load scored table from {:?}", config.dataset.path))?;

    let mut engine = BacktestEngine::new(&config.backtest)?;
    let results = engine.run(&observations);
    tracing::info!(periods = results.len(), "Backtest complete");

    let summary = PerformanceAnalyzer::new(&config.analysis).summarize(&results);

    if args.json {
        report::print_json(&JsonReport {
            job_id: None,
            folds: &[],
            skipped: &[],
            periods: results.len(),
            summary,
        })?;
    } else {
        report::print_summary(&summary);
    }

    if let Some(path) = &args.output {
        report::write_results(path, &results)?;
    }
    Ok(())
}
