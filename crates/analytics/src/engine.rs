use crate::report::{PerformanceSummary, SeriesStats};
use configuration::{AlignmentPolicy, AnalysisSettings};
use core_types::PeriodResult;

/// Volatilities below this are treated as zero when forming the Sharpe ratio.
const ZERO_VOL_EPSILON: f64 = 1e-12;

/// A stateless calculator for deriving performance metrics from per-period returns.
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    periods_per_year: f64,
    risk_free_rate: f64,
    alignment: AlignmentPolicy,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default())
    }
}

impl PerformanceAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            periods_per_year: f64::from(settings.periods_per_year),
            risk_free_rate: settings.risk_free_rate,
            alignment: settings.alignment,
        }
    }

    /// `(1 + mean(r))^periods_per_year - 1`. `None` for an empty series.
    pub fn annualized_return(&self, returns: &[f64]) -> Option<f64> {
        let mean = mean(returns)?;
        Some((1.0 + mean).powf(self.periods_per_year) - 1.0)
    }

    /// Sample standard deviation scaled by `sqrt(periods_per_year)`.
    /// `None` with fewer than two observations.
    pub fn annualized_vol(&self, returns: &[f64]) -> Option<f64> {
        sample_std(returns).map(|std| std * self.periods_per_year.sqrt())
    }

    /// Annualised excess return over annualised excess volatility.
    ///
    /// Returns `None` when the volatility is zero or cannot be computed.
    pub fn sharpe_ratio(&self, returns: &[f64]) -> Option<f64> {
        let per_period_rf = self.risk_free_rate / self.periods_per_year;
        let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

        let vol = self.annualized_vol(&excess)?;
        if vol.abs() < ZERO_VOL_EPSILON || !vol.is_finite() {
            return None;
        }
        Some(self.annualized_return(&excess)? / vol)
    }

    /// All four statistics for one series.
    pub fn series_stats(&self, returns: &[f64]) -> SeriesStats {
        SeriesStats {
            annualized_return: self.annualized_return(returns),
            annualized_vol: self.annualized_vol(returns),
            sharpe_ratio: self.sharpe_ratio(returns),
            max_drawdown: max_drawdown(&equity_curve(returns)),
        }
    }

    /// Summarises a backtest: portfolio net returns against benchmark returns.
    pub fn summarize(&self, results: &[PeriodResult]) -> PerformanceSummary {
        let portfolio: Vec<Option<f64>> = results.iter().map(|r| Some(r.net_return)).collect();
        let benchmark: Vec<Option<f64>> = results.iter().map(|r| r.benchmark_return).collect();
        let (portfolio, benchmark) = self.align(&portfolio, &benchmark);

        PerformanceSummary::from_stats(
            self.series_stats(&portfolio),
            self.series_stats(&benchmark),
        )
    }

    fn align(&self, portfolio: &[Option<f64>], benchmark: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
        match self.alignment {
            AlignmentPolicy::Independent => (
                portfolio.iter().flatten().copied().collect(),
                benchmark.iter().flatten().copied().collect(),
            ),
            AlignmentPolicy::Paired => {
                let dropped = portfolio
                    .iter()
                    .zip(benchmark)
                    .filter(|(p, b)| p.is_none() || b.is_none())
                    .count();
                if dropped > 0 {
                    tracing::debug!(dropped, "Dropping periods missing on either side");
                }
                portfolio
                    .iter()
                    .zip(benchmark)
                    .filter_map(|(p, b)| Some(((*p)?, (*b)?)))
                    .unzip()
            }
        }
    }
}

/// Cumulative growth of one unit, `cumprod(1 + r)`: one point per period.
///
/// The first period's value is its own running peak, so a loss in that
/// period alone is not a drawdown.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect()
}

/// The worst `equity / running_peak - 1` along the curve. Always `<= 0`.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut worst = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            worst = worst.min(equity / peak - 1.0);
        }
    }
    worst
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period(week: u32, net: f64, bench: Option<f64>) -> PeriodResult {
        PeriodResult {
            period: NaiveDate::from_ymd_opt(2020, 1, 3).unwrap() + chrono::Duration::weeks(week as i64),
            fold_year: Some(2020),
            holdings: 2,
            gross_return: net,
            turnover: 0.0,
            cost: 0.0,
            net_return: net,
            benchmark_return: bench,
            excess_return: bench.map(|b| net - b),
        }
    }

    #[test]
    fn test_annualized_return_of_zero_series_is_exactly_zero() {
        let analyzer = PerformanceAnalyzer::default();
        assert_eq!(analyzer.annualized_return(&[0.0; 10]), Some(0.0));
    }

    #[test]
    fn test_annualized_return_compounds_mean() {
        let analyzer = PerformanceAnalyzer::default();
        let ann = analyzer.annualized_return(&[0.01, 0.03]).unwrap();
        assert!((ann - (1.02_f64.powi(52) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_annualized_vol_uses_sample_std() {
        let analyzer = PerformanceAnalyzer::default();
        // mean 0.02, deviations +-0.01, sample variance = 2e-4 / 1
        let vol = analyzer.annualized_vol(&[0.01, 0.03]).unwrap();
        assert!((vol - (2e-4_f64).sqrt() * 52_f64.sqrt()).abs() < 1e-12);
        assert_eq!(analyzer.annualized_vol(&[0.01]), None);
    }

    #[test]
    fn test_sharpe_is_undefined_for_constant_returns() {
        let analyzer = PerformanceAnalyzer::default();
        assert_eq!(analyzer.sharpe_ratio(&[0.01, 0.01, 0.01, 0.01]), None);
        assert_eq!(analyzer.sharpe_ratio(&[]), None);
    }

    #[test]
    fn test_sharpe_with_risk_free_rate() {
        let settings = AnalysisSettings {
            risk_free_rate: 0.052,
            ..AnalysisSettings::default()
        };
        let analyzer = PerformanceAnalyzer::new(&settings);
        let returns = [0.011, 0.021, -0.009];
        let excess: Vec<f64> = returns.iter().map(|r| r - 0.001).collect();

        let expected = PerformanceAnalyzer::default().annualized_return(&excess).unwrap()
            / PerformanceAnalyzer::default().annualized_vol(&excess).unwrap();
        assert!((analyzer.sharpe_ratio(&returns).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown_is_zero_for_non_decreasing_curve() {
        let curve = equity_curve(&[0.01, 0.0, 0.02, 0.0]);
        assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn test_max_drawdown_measures_peak_to_trough() {
        // 1.1 -> 0.88 -> 0.968
        let curve = equity_curve(&[0.1, -0.2, 0.1]);
        let dd = max_drawdown(&curve);
        assert!((dd - (-0.2)).abs() < 1e-12);
        assert!(dd <= 0.0);
    }

    #[test]
    fn test_equity_curve_has_one_point_per_period() {
        let curve = equity_curve(&[0.1, -0.5]);
        assert_eq!(curve.len(), 2);
        assert!((curve[0] - 1.1).abs() < 1e-12);
        assert!((curve[1] - 0.55).abs() < 1e-12);
        assert!(equity_curve(&[]).is_empty());
    }

    #[test]
    fn test_first_period_loss_is_not_a_drawdown() {
        let curve = equity_curve(&[-0.05, 0.01]);
        assert_eq!(max_drawdown(&curve), 0.0);

        let summary = PerformanceAnalyzer::default().summarize(&[period(0, -0.05, None), period(1, 0.01, None)]);
        assert_eq!(summary.port_max_dd, 0.0);
    }

    #[test]
    fn test_drawdown_after_first_period_loss() {
        // 0.95 -> 0.9595 -> 0.86355
        let curve = equity_curve(&[-0.05, 0.01, -0.1]);
        assert!((max_drawdown(&curve) - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_summary() {
        let summary = PerformanceAnalyzer::default().summarize(&[]);
        assert_eq!(summary.port_ann_ret, None);
        assert_eq!(summary.port_sharpe, None);
        assert_eq!(summary.port_max_dd, 0.0);
        assert_eq!(summary.bench_ann_vol, None);
    }

    #[test]
    fn test_independent_alignment_keeps_all_portfolio_periods() {
        let results = vec![
            period(0, 0.01, Some(0.005)),
            period(1, -0.02, None),
            period(2, 0.03, Some(0.01)),
        ];
        let analyzer = PerformanceAnalyzer::default();
        let summary = analyzer.summarize(&results);

        let port = analyzer.series_stats(&[0.01, -0.02, 0.03]);
        let bench = analyzer.series_stats(&[0.005, 0.01]);
        assert_eq!(summary, PerformanceSummary::from_stats(port, bench));
    }

    #[test]
    fn test_paired_alignment_matches_omitting_the_period() {
        let settings = AnalysisSettings {
            alignment: AlignmentPolicy::Paired,
            ..AnalysisSettings::default()
        };
        let analyzer = PerformanceAnalyzer::new(&settings);

        let with_gap = vec![
            period(0, 0.01, Some(0.005)),
            period(1, -0.02, None),
            period(2, 0.03, Some(0.01)),
            period(3, 0.004, Some(-0.002)),
        ];
        let omitted: Vec<PeriodResult> = with_gap
            .iter()
            .filter(|r| r.benchmark_return.is_some())
            .cloned()
            .collect();

        assert_eq!(analyzer.summarize(&with_gap), analyzer.summarize(&omitted));
    }

    #[test]
    fn test_summary_serializes_with_fixed_keys() {
        let summary = PerformanceAnalyzer::default().summarize(&[period(0, 0.01, Some(0.02))]);
        let json = serde_json::to_value(summary).unwrap();
        for key in [
            "Port_AnnRet", "Port_AnnVol", "Port_Sharpe", "Port_MaxDD",
            "Bench_AnnRet", "Bench_AnnVol", "Bench_Sharpe", "Bench_MaxDD",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
