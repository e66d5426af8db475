use serde::{Deserialize, Serialize};

/// Risk/return statistics for one return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub annualized_return: Option<f64>,
    pub annualized_vol: Option<f64>,
    pub sharpe_ratio: Option<f64>, // None when volatility is zero or undefined
    pub max_drawdown: f64,
}

/// The standard eight-metric summary of a backtest.
///
/// Serialises with the same keys the research notebooks use
/// (`Port_AnnRet`, `Bench_MaxDD`, ...). `None` marks an undefined metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    #[serde(rename = "Port_AnnRet")]
    pub port_ann_ret: Option<f64>,
    #[serde(rename = "Port_AnnVol")]
    pub port_ann_vol: Option<f64>,
    #[serde(rename = "Port_Sharpe")]
    pub port_sharpe: Option<f64>,
    #[serde(rename = "Port_MaxDD")]
    pub port_max_dd: f64,
    #[serde(rename = "Bench_AnnRet")]
    pub bench_ann_ret: Option<f64>,
    #[serde(rename = "Bench_AnnVol")]
    pub bench_ann_vol: Option<f64>,
    #[serde(rename = "Bench_Sharpe")]
    pub bench_sharpe: Option<f64>,
    #[serde(rename = "Bench_MaxDD")]
    pub bench_max_dd: f64,
}

impl PerformanceSummary {
    pub fn from_stats(portfolio: SeriesStats, benchmark: SeriesStats) -> Self {
        Self {
            port_ann_ret: portfolio.annualized_return,
            port_ann_vol: portfolio.annualized_vol,
            port_sharpe: portfolio.sharpe_ratio,
            port_max_dd: portfolio.max_drawdown,
            bench_ann_ret: benchmark.annualized_return,
            bench_ann_vol: benchmark.annualized_vol,
            bench_sharpe: benchmark.sharpe_ratio,
            bench_max_dd: benchmark.max_drawdown,
        }
    }

    /// The metrics as (name, portfolio, benchmark) rows, in display order.
    pub fn rows(&self) -> [(&'static str, Option<f64>, Option<f64>); 4] {
        [
            ("AnnRet", self.port_ann_ret, self.bench_ann_ret),
            ("AnnVol", self.port_ann_vol, self.bench_ann_vol),
            ("Sharpe", self.port_sharpe, self.bench_sharpe),
            ("MaxDD", Some(self.port_max_dd), Some(self.bench_max_dd)),
        ]
    }
}
