use crate::data_handler::AssetScore;
use crate::error::BacktestError;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Target weights for one period.
///
/// Every asset observed in the period appears exactly once, in encounter
/// order. Weights are non-negative and sum to 1.0 when anything is selected,
/// 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub period: NaiveDate,
    weights: Vec<(String, f64)>,
}

impl PortfolioSnapshot {
    pub fn weights(&self) -> &[(String, f64)] {
        &self.weights
    }

    pub fn weight_of(&self, asset: &str) -> f64 {
        self.weights
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Number of assets with a positive weight.
    pub fn holdings(&self) -> usize {
        self.weights.iter().filter(|(_, w)| *w > 0.0).count()
    }
}

/// Equal-weights the top `top_quantile` of each period's cross-section.
#[derive(Debug, Clone)]
pub struct PortfolioConstructor {
    top_quantile: f64,
}

impl PortfolioConstructor {
    pub fn new(top_quantile: f64) -> Result<Self, BacktestError> {
        if !(top_quantile > 0.0 && top_quantile <= 1.0) {
            return Err(BacktestError::InvalidParameters(format!(
                "top_quantile must be in (0, 1], got {top_quantile}"
            )));
        }
        Ok(Self { top_quantile })
    }

    /// Ranks the period's assets by score and equal-weights the selected ones.
    ///
    /// Rank 1 is the highest score; equal scores are ranked in encounter order.
    /// An asset is selected when `rank / count <= top_quantile`. NaN scores are
    /// neither ranked nor counted and always receive weight 0.
    pub fn construct(&self, period: NaiveDate, assets: &[AssetScore]) -> PortfolioSnapshot {
        let mut ranked: Vec<usize> = (0..assets.len())
            .filter(|&i| !assets[i].score.is_nan())
            .collect();
        // Stable sort, so ties keep encounter order.
        ranked.sort_by(|&a, &b| {
            assets[b]
                .score
                .partial_cmp(&assets[a].score)
                .unwrap_or(Ordering::Equal)
        });

        let count = ranked.len() as f64;
        let selected: Vec<usize> = ranked
            .iter()
            .enumerate()
            .take_while(|(pos, _)| (*pos + 1) as f64 / count <= self.top_quantile)
            .map(|(_, &idx)| idx)
            .collect();

        let mut weights: Vec<(String, f64)> = assets.iter().map(|a| (a.asset.clone(), 0.0)).collect();

        // k == 0 leaves every weight at zero.
        if !selected.is_empty() {
            let weight = 1.0 / selected.len() as f64;
            for idx in selected {
                weights[idx].1 = weight;
            }
        }

        PortfolioSnapshot { period, weights }
    }
}
