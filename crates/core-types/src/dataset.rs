use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One labelled input row, keyed by (period date, asset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub date: NaiveDate,
    pub asset: String,
    /// Feature values in the order of `Dataset::feature_names`.
    pub features: Vec<Option<f64>>,
    /// Binary label (1 = outperformed the benchmark).
    pub label: Option<i32>,
    /// Realised return over the holding period that starts at `date`.
    pub forward_return: Option<f64>,
}

impl LabeledRow {
    /// The calendar year the row belongs to. Folds are keyed by this value.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// True when every feature and the label are present. NaN counts as missing.
    pub fn is_complete(&self) -> bool {
        self.label.is_some()
            && self
                .features
                .iter()
                .all(|f| matches!(f, Some(v) if !v.is_nan()))
    }

    /// The dense feature vector, or `None` if any value is missing.
    pub fn feature_vector(&self) -> Option<Vec<f64>> {
        self.features
            .iter()
            .map(|&f| f.filter(|v| !v.is_nan()))
            .collect()
    }
}

/// An immutable, chronologically ordered table of labelled rows.
///
/// Rows are stably sorted by date on construction, so rows sharing a date keep
/// the order in which they were supplied. All year-based slicing relies on this.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    feature_names: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, mut rows: Vec<LabeledRow>) -> Result<Self, CoreError> {
        let expected = feature_names.len();
        if let Some(bad) = rows.iter().find(|r| r.features.len() != expected) {
            return Err(CoreError::FeatureCountMismatch {
                asset: bad.asset.clone(),
                date: bad.date.to_string(),
                expected,
                got: bad.features.len(),
            });
        }

        rows.sort_by_key(|r| r.date);

        Ok(Self {
            feature_names,
            rows,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows whose year is strictly less than `year`.
    pub fn rows_before_year(&self, year: i32) -> &[LabeledRow] {
        let end = self.rows.partition_point(|r| r.year() < year);
        &self.rows[..end]
    }

    /// All rows whose year equals `year`.
    pub fn rows_in_year(&self, year: i32) -> &[LabeledRow] {
        let start = self.rows.partition_point(|r| r.year() < year);
        let end = self.rows.partition_point(|r| r.year() <= year);
        &self.rows[start..end]
    }
}
