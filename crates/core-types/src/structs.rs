use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scored (period, asset) pair ready to be backtested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: NaiveDate,
    pub asset: String,
    /// Model output, higher means more preferred.
    pub score: f64,
    pub forward_return: Option<f64>,
}

/// The outcome of a single backtest period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub period: NaiveDate,
    /// The walk-forward fold that produced this period, if any.
    pub fold_year: Option<i32>,
    /// Number of assets held during the period.
    pub holdings: usize,
    pub gross_return: f64,
    pub turnover: f64,
    pub cost: f64,
    pub net_return: f64,
    pub benchmark_return: Option<f64>,
    pub excess_return: Option<f64>,
}
