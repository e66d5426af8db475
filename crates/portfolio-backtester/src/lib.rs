//! # Meridian Portfolio Backtester
//!
//! This crate turns per-period model scores into an equal-weighted top-quantile
//! portfolio and measures its returns net of turnover costs against a
//! benchmark. It uses a "master clock" architecture: observations are grouped
//! into periods and processed strictly chronologically, with the previous
//! period's weights carried explicitly in a `WeightState`.

pub mod constructor;
pub mod costs;
pub mod data_handler;
pub mod engine;
pub mod error;

pub use constructor::{PortfolioConstructor, PortfolioSnapshot};
pub use costs::{TradingCost, TransactionCostModel, WeightState};
pub use data_handler::{group_into_periods, AssetScore, PeriodSlice};
pub use engine::BacktestEngine;
pub use error::BacktestError;
