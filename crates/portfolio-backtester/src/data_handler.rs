use chrono::NaiveDate;
use core_types::Observation;
use std::collections::BTreeMap;

/// One asset's entry within a period.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetScore {
    pub asset: String,
    pub score: f64,
    pub forward_return: Option<f64>,
}

/// Everything the engine needs to know about a single period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSlice {
    pub period: NaiveDate,
    /// Assets in the order they were first encountered.
    pub assets: Vec<AssetScore>,
    /// The benchmark's forward return, if the benchmark was observed with a return.
    pub benchmark_return: Option<f64>,
}

/// Groups flat observations into periods and sorts them chronologically.
///
/// This is the "master clock": the engine never looks at a previous weight
/// before this ordering has been established. Within a period, assets keep
/// their encounter order, which is what breaks score ties. The benchmark stays
/// in the cross-section and is additionally surfaced as `benchmark_return`.
pub fn group_into_periods(observations: &[Observation], benchmark_id: &str) -> Vec<PeriodSlice> {
    let mut periods: BTreeMap<NaiveDate, PeriodSlice> = BTreeMap::new();

    for obs in observations {
        let slice = periods.entry(obs.period).or_insert_with(|| PeriodSlice {
            period: obs.period,
            assets: Vec::new(),
            benchmark_return: None,
        });

        if obs.asset == benchmark_id && slice.benchmark_return.is_none() {
            slice.benchmark_return = obs.forward_return;
        }

        slice.assets.push(AssetScore {
            asset: obs.asset.clone(),
            score: obs.score,
            forward_return: obs.forward_return,
        });
    }

    periods.into_values().collect()
}
