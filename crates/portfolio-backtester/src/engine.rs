use crate::constructor::PortfolioConstructor;
use crate::costs::{TransactionCostModel, WeightState};
use crate::data_handler::{group_into_periods, PeriodSlice};
use crate::error::BacktestError;
use configuration::BacktestSettings;
use core_types::{Observation, PeriodResult};

/// Runs the top-quantile strategy period by period.
///
/// Each engine owns its `WeightState`; it is cleared at the start of every
/// run, so two runs never share turnover history.
pub struct BacktestEngine {
    constructor: PortfolioConstructor,
    cost_model: TransactionCostModel,
    weight_state: WeightState,
    benchmark_id: String,
    fold_year: Option<i32>,
}

impl BacktestEngine {
    pub fn new(settings: &BacktestSettings) -> Result<Self, BacktestError> {
        Ok(Self {
            constructor: PortfolioConstructor::new(settings.top_quantile)?,
            cost_model: TransactionCostModel::new(settings.transaction_cost_bps)?,
            weight_state: WeightState::new(),
            benchmark_id: settings.benchmark_id.clone(),
            fold_year: None,
        })
    }

    /// Tags every produced `PeriodResult` with a walk-forward fold year.
    pub fn with_fold_year(mut self, year: i32) -> Self {
        self.fold_year = Some(year);
        self
    }

    /// Backtests a flat set of scored observations.
    ///
    /// Observations may arrive in any order; they are grouped into periods and
    /// processed chronologically. One result is produced per distinct period.
    pub fn run(&mut self, observations: &[Observation]) -> Vec<PeriodResult> {
        let periods = group_into_periods(observations, &self.benchmark_id);
        self.weight_state.reset();
        periods.iter().map(|slice| self.process_period(slice)).collect()
    }

    fn process_period(&mut self, slice: &PeriodSlice) -> PeriodResult {
        // 1. Target weights from this period's scores.
        let snapshot = self.constructor.construct(slice.period, &slice.assets);

        // 2. Gross return. A missing forward return contributes nothing.
        let gross_return: f64 = slice
            .assets
            .iter()
            .zip(snapshot.weights())
            .map(|(asset, (_, weight))| weight * asset.forward_return.unwrap_or(0.0))
            .sum();

        // 3. Costs against the previous weights, then roll the state forward.
        let trading = self.cost_model.evaluate(&snapshot, &self.weight_state);
        let net_return = gross_return - trading.cost;
        self.weight_state.update(&snapshot);

        // 4. Benchmark is a left join: a missing value never fails the period.
        let benchmark_return = slice.benchmark_return;
        let excess_return = benchmark_return.map(|bench| net_return - bench);

        tracing::debug!(
            period = %slice.period,
            holdings = snapshot.holdings(),
            turnover = trading.turnover,
            net_return,
            exposure = self.weight_state.gross_exposure(),
            "Processed period"
        );

        PeriodResult {
            period: slice.period,
            fold_year: self.fold_year,
            holdings: snapshot.holdings(),
            gross_return,
            turnover: trading.turnover,
            cost: trading.cost,
            net_return,
            benchmark_return,
            excess_return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 3).unwrap() + chrono::Duration::weeks(n)
    }

    fn obs(n: i64, asset: &str, score: f64, ret: f64) -> Observation {
        Observation {
            period: week(n),
            asset: asset.to_string(),
            score,
            forward_return: Some(ret),
        }
    }

    fn settings(top_quantile: f64, cost_bps: f64) -> BacktestSettings {
        BacktestSettings {
            top_quantile,
            transaction_cost_bps: cost_bps,
            benchmark_id: "SPY".to_string(),
        }
    }

    #[test]
    fn test_two_asset_single_period_example() {
        let mut engine = BacktestEngine::new(&settings(0.5, 20.0)).unwrap();
        let results = engine.run(&[obs(0, "A", 0.9, 0.02), obs(0, "B", 0.1, -0.01)]);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.holdings, 1);
        assert!((r.gross_return - 0.02).abs() < 1e-12);
        assert!((r.turnover - 0.5).abs() < 1e-12);
        assert!((r.cost - 0.001).abs() < 1e-12);
        assert!((r.net_return - 0.019).abs() < 1e-12);
        assert_eq!(r.benchmark_return, None);
        assert_eq!(r.excess_return, None);
    }

    #[test]
    fn test_unchanged_holdings_cost_nothing_after_first_period() {
        let mut engine = BacktestEngine::new(&settings(0.5, 20.0)).unwrap();
        let results = engine.run(&[
            obs(0, "A", 0.9, 0.01),
            obs(0, "B", 0.1, 0.0),
            obs(1, "A", 0.8, 0.02),
            obs(1, "B", 0.2, 0.0),
        ]);

        assert!((results[0].turnover - 0.5).abs() < 1e-12);
        assert_eq!(results[1].turnover, 0.0);
        assert_eq!(results[1].net_return, results[1].gross_return);
    }

    #[test]
    fn test_empty_selection_unwinds_previous_portfolio() {
        // Period 0 has four assets (one selected at q = 0.25); period 1 has
        // three, so nothing qualifies and the position must be sold.
        let mut engine = BacktestEngine::new(&settings(0.25, 20.0)).unwrap();
        let results = engine.run(&[
            obs(0, "A", 0.9, 0.01),
            obs(0, "B", 0.5, 0.01),
            obs(0, "C", 0.4, 0.01),
            obs(0, "D", 0.1, 0.01),
            obs(1, "A", 0.9, 0.03),
            obs(1, "B", 0.5, 0.03),
            obs(1, "C", 0.4, 0.03),
        ]);

        let unwind = &results[1];
        assert_eq!(unwind.holdings, 0);
        assert_eq!(unwind.gross_return, 0.0);
        assert!((unwind.turnover - 0.5).abs() < 1e-12);
        assert!((unwind.net_return + 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_benchmark_left_join() {
        let mut engine = BacktestEngine::new(&settings(0.5, 0.0)).unwrap();
        let results = engine.run(&[
            obs(0, "A", 0.9, 0.02),
            obs(0, "SPY", 0.1, 0.005),
            obs(1, "A", 0.9, 0.01),
            obs(1, "B", 0.1, 0.0),
        ]);

        assert_eq!(results[0].benchmark_return, Some(0.005));
        assert!((results[0].excess_return.unwrap() - 0.015).abs() < 1e-12);
        assert_eq!(results[1].benchmark_return, None);
        assert_eq!(results[1].excess_return, None);
    }

    #[test]
    fn test_each_run_starts_from_empty_state() {
        let mut engine = BacktestEngine::new(&settings(0.5, 20.0)).unwrap();
        let observations = [obs(0, "A", 0.9, 0.02), obs(0, "B", 0.1, -0.01)];

        let first = engine.run(&observations);
        let second = engine.run(&observations);
        assert_eq!(first, second);
        assert!((second[0].turnover - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weights_sum_to_one_or_zero_each_period() {
        let mut engine = BacktestEngine::new(&settings(0.2, 20.0)).unwrap();
        let mut observations = Vec::new();
        for n in 0..6 {
            for (i, asset) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
                if (i as i64 + n) % 3 != 0 {
                    let score = ((i as i64 * 7 + n * 3) % 11) as f64;
                    observations.push(obs(n, asset, score, 0.01));
                }
            }
        }
        let results = engine.run(&observations);

        for r in &results {
            // Every asset returned 1%, so gross return equals total weight.
            let total_weight = r.gross_return / 0.01;
            assert!(
                (total_weight - 1.0).abs() < 1e-9 || total_weight.abs() < 1e-12,
                "period {} total weight {}",
                r.period,
                total_weight
            );
        }
    }

    #[test]
    fn test_results_are_chronological_and_tagged() {
        let mut engine = BacktestEngine::new(&settings(0.5, 20.0)).unwrap().with_fold_year(2020);
        let results = engine.run(&[obs(2, "A", 0.5, 0.0), obs(0, "A", 0.5, 0.0), obs(1, "A", 0.5, 0.0)]);

        let periods: Vec<_> = results.iter().map(|r| r.period).collect();
        assert_eq!(periods, vec![week(0), week(1), week(2)]);
        assert!(results.iter().all(|r| r.fold_year == Some(2020)));
    }
}
