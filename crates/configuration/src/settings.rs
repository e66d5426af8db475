use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; missing sections fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetSettings,
    pub backtest: BacktestSettings,
    pub walk_forward: WalkForwardSettings,
    pub model: ModelSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
}

/// Where the labelled table lives and which columns it must expose.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Parquet or CSV file with one row per (date, asset).
    pub path: PathBuf,
    pub date_column: String,
    pub asset_column: String,
    pub label_column: String,
    /// The realised forward return of the row's holding period.
    pub return_column: String,
    /// Pre-computed model score, only read by the standalone `backtest` command.
    pub score_column: String,
    pub feature_columns: Vec<String>,
}

/// Contains parameters for the portfolio construction and cost model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Fraction of the cross-section to hold each period (0.2 = top quintile).
    pub top_quantile: f64,
    /// Round-trip cost charged on turnover, in basis points.
    pub transaction_cost_bps: f64,
    /// The asset whose forward return is the benchmark (e.g., "SPY").
    pub benchmark_id: String,
}

/// Contains parameters for the yearly walk-forward loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkForwardSettings {
    pub start_year: i32,
    /// Inclusive.
    pub end_year: i32,
    /// Trailing share of the training rows held out for validation.
    pub validation_fraction: f64,
    /// Run folds on the rayon thread pool.
    pub parallel: bool,
    /// Draw a progress bar while folds are running.
    pub show_progress: bool,
}

/// Hyper-parameters for the logistic scoring model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Training stops once the log-loss improves by less than this.
    pub tolerance: f64,
    pub l2_penalty: f64,
}

/// How the portfolio and benchmark series are lined up before summarising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AlignmentPolicy {
    /// Each side drops only its own missing values.
    #[default]
    Independent,
    /// A period missing on either side is dropped from both.
    Paired,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub periods_per_year: u32,
    /// Annual risk-free rate used by the Sharpe ratio.
    pub risk_free_rate: f64,
    pub alignment: AlignmentPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
}

// --- Default Implementations ---
// These mirror the reference research setup: weekly data, top quintile,
// 20 bps costs and SPY as the benchmark.

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/processed/features_labels_weekly.parquet"),
            date_column: "Date".to_string(),
            asset_column: "Ticker".to_string(),
            label_column: "Label".to_string(),
            return_column: "Return_1w".to_string(),
            score_column: "PredProb".to_string(),
            feature_columns: [
                "Mom_12_1", "Vol_4w", "Vol_12w", "Px_SMA4", "Px_SMA12", "RSI_14", "ATR_14",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            top_quantile: 0.2,
            transaction_cost_bps: 20.0,
            benchmark_id: "SPY".to_string(),
        }
    }
}

impl Default for WalkForwardSettings {
    fn default() -> Self {
        Self {
            start_year: 2018,
            end_year: 2024,
            validation_fraction: 0.2,
            parallel: false,
            show_progress: false,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iterations: 500,
            tolerance: 1e-7,
            l2_penalty: 0.0,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            periods_per_year: 52,
            risk_free_rate: 0.0,
            alignment: AlignmentPolicy::Independent,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.top_quantile > 0.0 && self.top_quantile <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "backtest.top_quantile must be in (0, 1], got {}",
                self.top_quantile
            )));
        }
        if !self.transaction_cost_bps.is_finite() || self.transaction_cost_bps < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "backtest.transaction_cost_bps must be a non-negative number, got {}",
                self.transaction_cost_bps
            )));
        }
        if self.benchmark_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backtest.benchmark_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl WalkForwardSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_year > self.end_year {
            return Err(ConfigError::ValidationError(format!(
                "walk_forward.start_year ({}) is after end_year ({})",
                self.start_year, self.end_year
            )));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(ConfigError::ValidationError(format!(
                "walk_forward.validation_fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        Ok(())
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::ValidationError(
                "model.learning_rate must be positive".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.tolerance < 0.0 || self.l2_penalty < 0.0 {
            return Err(ConfigError::ValidationError(
                "model.tolerance and model.l2_penalty must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.periods_per_year must be at least 1".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError(
                "analysis.risk_free_rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatasetSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feature_columns.is_empty() {
            return Err(ConfigError::ValidationError(
                "dataset.feature_columns must list at least one column".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Checks every section. Called before any data is loaded or fold is run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()?;
        self.backtest.validate()?;
        self.walk_forward.validate()?;
        self.model.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backtest.top_quantile, 0.2);
        assert_eq!(config.backtest.transaction_cost_bps, 20.0);
        assert_eq!(config.analysis.periods_per_year, 52);
        assert_eq!(config.dataset.feature_columns.len(), 7);
    }

    #[test]
    fn test_zero_quantile_is_rejected() {
        let mut config = Config::default();
        config.backtest.top_quantile = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_inverted_years_are_rejected() {
        let mut config = Config::default();
        config.walk_forward.start_year = 2025;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_full_validation_fraction_is_rejected() {
        let mut config = Config::default();
        config.walk_forward.validation_fraction = 1.0;
        assert!(config.validate().is_err());
    }
}
