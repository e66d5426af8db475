use configuration::{BacktestSettings, Config, WalkForwardSettings};
use core_types::{Dataset, LabeledRow, Observation, PeriodResult};
use indicatif::{ProgressBar, ProgressStyle};
use ml_trainer::{positive_rate, roc_auc, Classifier};
use portfolio_backtester::BacktestEngine;
use rayon::prelude::*;
use uuid::Uuid;

pub mod error;
pub mod report;

pub use error::WfoError;
pub use report::{FoldSummary, SkipReason, SkippedFold, WalkForwardReport};

/// Result of evaluating one calendar year.
enum FoldOutcome {
    Completed(FoldSummary, Vec<PeriodResult>),
    Skipped(SkippedFold),
}

/// Complete rows of one side of a fold, split into model inputs.
struct FoldRows<'a> {
    rows: Vec<&'a LabeledRow>,
    features: Vec<Vec<f64>>,
    labels: Vec<i32>,
}

impl<'a> FoldRows<'a> {
    /// Keeps rows with every feature and a label, in their original order.
    fn complete(rows: &'a [LabeledRow]) -> Self {
        let mut kept = Vec::new();
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for row in rows {
            if let (Some(vector), Some(label)) = (row.feature_vector(), row.label) {
                kept.push(row);
                features.push(vector);
                labels.push(label);
            }
        }
        Self {
            rows: kept,
            features,
            labels,
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The master engine for walk-forward evaluation.
///
/// For each test year `Y` the classifier is trained only on rows dated before
/// `Y`, the trailing share of those rows is held out for validation, and the
/// rows of `Y` are scored and backtested by a fresh `BacktestEngine`.
pub struct WalkForwardHarness {
    wfo_job_id: Uuid,
    settings: WalkForwardSettings,
    backtest: BacktestSettings,
    classifier: Box<dyn Classifier>,
}

impl WalkForwardHarness {
    pub fn new(
        settings: WalkForwardSettings,
        backtest: BacktestSettings,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, WfoError> {
        settings.validate()?;
        backtest.validate()?;
        Ok(Self {
            wfo_job_id: Uuid::new_v4(),
            settings,
            backtest,
            classifier,
        })
    }

    pub fn from_config(config: &Config, classifier: Box<dyn Classifier>) -> Result<Self, WfoError> {
        Self::new(config.walk_forward.clone(), config.backtest.clone(), classifier)
    }

    pub fn job_id(&self) -> Uuid {
        self.wfo_job_id
    }

    /// The main entry point to run every fold and collect the results.
    pub fn run(&self, dataset: &Dataset) -> Result<WalkForwardReport, WfoError> {
        let years: Vec<i32> = (self.settings.start_year..=self.settings.end_year).collect();

        tracing::info!(
            job_id = %self.wfo_job_id,
            classifier = self.classifier.name(),
            rows = dataset.len(),
            folds = years.len(),
            parallel = self.settings.parallel,
            "Starting walk-forward job"
        );

        let progress_bar = if self.settings.show_progress {
            let bar = ProgressBar::new(years.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} folds ({eta})")?
                    .progress_chars("=>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let evaluate = |&year: &i32| {
            let outcome = self.run_fold(dataset, year);
            progress_bar.inc(1);
            outcome
        };

        // Collecting preserves year order in both modes.
        let outcomes: Vec<FoldOutcome> = if self.settings.parallel {
            years.par_iter().map(evaluate).collect::<Result<_, _>>()?
        } else {
            years.iter().map(evaluate).collect::<Result<_, _>>()?
        };

        progress_bar.finish_and_clear();

        let mut results = Vec::new();
        let mut folds = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                FoldOutcome::Completed(summary, fold_results) => {
                    folds.push(summary);
                    results.extend(fold_results);
                }
                FoldOutcome::Skipped(skip) => skipped.push(skip),
            }
        }
        results.sort_by_key(|r| r.period);

        tracing::info!(
            job_id = %self.wfo_job_id,
            completed = folds.len(),
            skipped = skipped.len(),
            periods = results.len(),
            "Walk-forward job complete"
        );

        Ok(WalkForwardReport {
            job_id: self.wfo_job_id,
            results,
            folds,
            skipped,
        })
    }

    /// Trains on every year before `year` and backtests `year` out of sample.
    fn run_fold(&self, dataset: &Dataset, year: i32) -> Result<FoldOutcome, WfoError> {
        let skip = |reason: SkipReason| -> Result<FoldOutcome, WfoError> {
            tracing::warn!(job_id = %self.wfo_job_id, year, %reason, "Skipping fold");
            Ok(FoldOutcome::Skipped(SkippedFold { year, reason }))
        };

        let train_raw = dataset.rows_before_year(year);
        let test_raw = dataset.rows_in_year(year);
        if train_raw.is_empty() {
            return skip(SkipReason::NoTrainingRows);
        }
        if test_raw.is_empty() {
            return skip(SkipReason::NoTestRows);
        }

        let train = FoldRows::complete(train_raw);
        let test = FoldRows::complete(test_raw);
        if train.is_empty() {
            return skip(SkipReason::NoCompleteTrainingRows);
        }
        if test.is_empty() {
            return skip(SkipReason::NoCompleteTestRows);
        }

        // Order-preserving split: the most recent rows validate.
        let validation_rows = validation_size(train.len(), self.settings.validation_fraction);
        let fit_rows = train.len() - validation_rows;
        if fit_rows == 0 {
            return skip(SkipReason::NoFitRows);
        }
        let (fit_x, val_x) = train.features.split_at(fit_rows);
        let (fit_y, val_y) = train.labels.split_at(fit_rows);

        let trainer_error = |source: ml_trainer::TrainerError| WfoError::Trainer { year, source };
        let model = self.classifier.train(fit_x, fit_y).map_err(trainer_error)?;

        let validation_auc = if val_x.is_empty() {
            None
        } else {
            let val_scores = model.predict(val_x).map_err(trainer_error)?;
            roc_auc(val_y, &val_scores)
        };

        let scores = model.predict(&test.features).map_err(trainer_error)?;
        if scores.len() != test.len() {
            return Err(WfoError::ScoreCountMismatch {
                year,
                expected: test.len(),
                got: scores.len(),
            });
        }

        let observations: Vec<Observation> = test
            .rows
            .iter()
            .zip(scores)
            .map(|(row, score)| Observation {
                period: row.date,
                asset: row.asset.clone(),
                score,
                forward_return: row.forward_return,
            })
            .collect();

        let mut engine = BacktestEngine::new(&self.backtest)?.with_fold_year(year);
        let results = engine.run(&observations);

        let summary = FoldSummary {
            year,
            train_rows: train.len(),
            fit_rows,
            validation_rows,
            test_rows: test.len(),
            validation_auc,
            fit_positive_rate: positive_rate(fit_y),
            periods: results.len(),
        };

        tracing::info!(
            job_id = %self.wfo_job_id,
            year,
            fit_rows,
            validation_rows,
            test_rows = summary.test_rows,
            auc = ?validation_auc,
            periods = summary.periods,
            "Fold complete"
        );

        Ok(FoldOutcome::Completed(summary, results))
    }
}

/// `ceil(fraction * n)`, the size of the held-out validation tail.
fn validation_size(n: usize, fraction: f64) -> usize {
    ((n as f64) * fraction).ceil().min(n as f64) as usize
}
