use crate::constructor::PortfolioSnapshot;
use crate::error::BacktestError;
use std::collections::HashMap;

/// Basis points per unit.
const BPS: f64 = 10_000.0;

/// The last known weight of every asset the engine has seen during a run.
///
/// Owned by exactly one `BacktestEngine`; assets never seen count as weight 0.
#[derive(Debug, Clone, Default)]
pub struct WeightState {
    weights: HashMap<String, f64>,
}

impl WeightState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_weight(&self, asset: &str) -> f64 {
        self.weights.get(asset).copied().unwrap_or(0.0)
    }

    /// Records the snapshot's weights as the latest known weights.
    ///
    /// Assets missing from the snapshot keep their previous entry until they
    /// are observed again.
    pub fn update(&mut self, snapshot: &PortfolioSnapshot) {
        for (asset, weight) in snapshot.weights() {
            self.weights.insert(asset.clone(), *weight);
        }
    }

    pub fn reset(&mut self) {
        self.weights.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of the last known weights.
    pub fn gross_exposure(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingCost {
    pub turnover: f64,
    pub cost: f64,
}

/// Charges a flat number of basis points on one-way turnover.
#[derive(Debug, Clone)]
pub struct TransactionCostModel {
    cost_bps: f64,
}

impl TransactionCostModel {
    pub fn new(cost_bps: f64) -> Result<Self, BacktestError> {
        if !cost_bps.is_finite() || cost_bps < 0.0 {
            return Err(BacktestError::InvalidParameters(format!(
                "transaction cost must be a non-negative number of bps, got {cost_bps}"
            )));
        }
        Ok(Self { cost_bps })
    }

    /// `0.5 * sum(|w_now - w_prev|)` over the assets of the current snapshot.
    pub fn turnover(&self, snapshot: &PortfolioSnapshot, previous: &WeightState) -> f64 {
        0.5 * snapshot
            .weights()
            .iter()
            .map(|(asset, weight)| (weight - previous.previous_weight(asset)).abs())
            .sum::<f64>()
    }

    pub fn cost_for_turnover(&self, turnover: f64) -> f64 {
        turnover * self.cost_bps / BPS
    }

    /// Turnover and cost of moving from `previous` to `snapshot`. Pure; the
    /// caller updates the weight state afterwards.
    pub fn evaluate(&self, snapshot: &PortfolioSnapshot, previous: &WeightState) -> TradingCost {
        let turnover = self.turnover(snapshot, previous);
        TradingCost {
            turnover,
            cost: self.cost_for_turnover(turnover),
        }
    }
}
