//! # Meridian Analytics Engine
//!
//! This crate turns a sequence of backtest periods into summary risk/return
//! statistics. It acts as the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O. It depends only on `core-types` and the
//!   `[analysis]` settings from `configuration`.
//! - **Stateless Calculation:** The `PerformanceAnalyzer` takes per-period
//!   returns as input and produces a `PerformanceSummary` as output.
//! - **Undefined, not failed:** statistics that cannot be computed (empty
//!   series, zero volatility) come back as `None` rather than as errors.
//!
//! ## Public API
//!
//! - `PerformanceAnalyzer`: annualised return, volatility, Sharpe, drawdown.
//! - `PerformanceSummary`: the fixed eight-metric record (portfolio and benchmark).

// Declare the modules that constitute this crate.
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{equity_curve, max_drawdown, PerformanceAnalyzer};
pub use report::{PerformanceSummary, SeriesStats};
