use analytics::PerformanceSummary;
use anyhow::{Context, Result};
use chrono::Datelike;
use comfy_table::Table;
use core_types::PeriodResult;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use wfo::{FoldSummary, SkippedFold};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Everything printed with `--json`.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub folds: &'a [FoldSummary],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub skipped: &'a [SkippedFold],
    pub periods: usize,
    pub summary: PerformanceSummary,
}

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

pub fn print_summary(summary: &PerformanceSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Portfolio", "Benchmark"]);
    for (metric, portfolio, benchmark) in summary.rows() {
        table.add_row(vec![
            metric.to_string(),
            format_metric(portfolio),
            format_metric(benchmark),
        ]);
    }
    println!("{table}");
}

pub fn print_folds(folds: &[FoldSummary], skipped: &[SkippedFold]) {
    let mut table = Table::new();
    table.set_header(vec!["Year", "Fit", "Validation", "Test", "Val AUC", "Periods"]);
    for fold in folds {
        table.add_row(vec![
            fold.year.to_string(),
            fold.fit_rows.to_string(),
            fold.validation_rows.to_string(),
            fold.test_rows.to_string(),
            format_metric(fold.validation_auc),
            fold.periods.to_string(),
        ]);
    }
    println!("{table}");

    for skip in skipped {
        println!("Skipped {}: {}", skip.year, skip.reason);
    }
}

pub fn print_json(report: &JsonReport<'_>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Builds the per-period results table, one row per period.
pub fn results_frame(results: &[PeriodResult]) -> Result<DataFrame> {
    let days: Vec<i32> = results
        .iter()
        .map(|r| r.period.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let dates = Series::new("Date", days).cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        dates,
        Series::new("FoldYear", results.iter().map(|r| r.fold_year).collect::<Vec<_>>()),
        Series::new("Holdings", results.iter().map(|r| r.holdings as u64).collect::<Vec<_>>()),
        Series::new("GrossRet_1w", results.iter().map(|r| r.gross_return).collect::<Vec<_>>()),
        Series::new("Turnover", results.iter().map(|r| r.turnover).collect::<Vec<_>>()),
        Series::new("Cost", results.iter().map(|r| r.cost).collect::<Vec<_>>()),
        Series::new("PortRet_1w", results.iter().map(|r| r.net_return).collect::<Vec<_>>()),
        Series::new("BenchRet_1w", results.iter().map(|r| r.benchmark_return).collect::<Vec<_>>()),
        Series::new("ExcessRet_1w", results.iter().map(|r| r.excess_return).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

/// Writes the results as parquet (by extension) or CSV.
pub fn write_results(path: &Path, results: &[PeriodResult]) -> Result<()> {
    let mut df = results_frame(results)?;
    let mut file = File::create(path).with_context(|| format!("Failed to create output file at {path:?}"))?;

    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        ParquetWriter::new(&mut file).finish(&mut df)?;
    } else {
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    }

    tracing::info!(path = %path.display(), rows = df.height(), "Wrote period results");
    Ok(())
}
