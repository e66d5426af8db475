use core_types::PeriodResult;
use serde::Serialize;
use uuid::Uuid;

/// What one completed fold trained on and produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldSummary {
    pub year: i32,
    /// Complete training rows before the fit/validation split.
    pub train_rows: usize,
    pub fit_rows: usize,
    pub validation_rows: usize,
    /// Complete rows scored in the test year.
    pub test_rows: usize,
    /// ROC-AUC on the validation tail; `None` when it is empty or single-class.
    pub validation_auc: Option<f64>,
    pub fit_positive_rate: Option<f64>,
    pub periods: usize,
}

/// Why a year produced no results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NoTrainingRows,
    NoTestRows,
    NoCompleteTrainingRows,
    NoCompleteTestRows,
    NoFitRows,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NoTrainingRows => "no rows before the test year",
            SkipReason::NoTestRows => "no rows in the test year",
            SkipReason::NoCompleteTrainingRows => "no training rows with all features and a label",
            SkipReason::NoCompleteTestRows => "no test rows with all features and a label",
            SkipReason::NoFitRows => "validation split leaves nothing to fit on",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFold {
    pub year: i32,
    pub reason: SkipReason,
}

/// The outcome of a whole walk-forward run.
#[derive(Debug, Clone, Serialize)]
pub struct WalkForwardReport {
    pub job_id: Uuid,
    /// Every fold's period results, sorted by period.
    pub results: Vec<PeriodResult>,
    pub folds: Vec<FoldSummary>,
    pub skipped: Vec<SkippedFold>,
}

impl WalkForwardReport {
    pub fn skipped_years(&self) -> Vec<i32> {
        self.skipped.iter().map(|s| s.year).collect()
    }
}
